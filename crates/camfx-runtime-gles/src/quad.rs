use camfx_core::ShaderError;

use crate::gl::GlApi;

/// Interleaved `x, y, u, v` for a triangle strip covering clip space.
const QUAD_VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 0.0, //
    1.0, -1.0, 1.0, 0.0, //
    -1.0, 1.0, 0.0, 1.0, //
    1.0, 1.0, 1.0, 1.0,
];

const STRIDE: i32 = 4 * 4;

/// Full-screen quad in a vertex buffer. GLES2 has no VAOs, so attributes are bound per draw.
#[derive(Debug)]
pub struct FullscreenQuad<G: GlApi> {
    vbo: G::Buffer,
}

impl<G: GlApi> FullscreenQuad<G> {
    pub fn new(gl: &G) -> Result<Self, ShaderError> {
        let vbo = gl
            .create_buffer()
            .map_err(|e| ShaderError::Create(format!("create_buffer: {e}")))?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&QUAD_VERTICES),
            glow::STATIC_DRAW,
        );
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        Ok(Self { vbo })
    }

    /// Binds the quad to the given attribute slots and draws it.
    pub fn draw(&self, gl: &G, position: Option<u32>, texture_coord: Option<u32>) {
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.vbo));
        if let Some(loc) = position {
            gl.enable_vertex_attrib_array(loc);
            gl.vertex_attrib_pointer_f32(loc, 2, glow::FLOAT, false, STRIDE, 0);
        }
        if let Some(loc) = texture_coord {
            gl.enable_vertex_attrib_array(loc);
            gl.vertex_attrib_pointer_f32(loc, 2, glow::FLOAT, false, STRIDE, 2 * 4);
        }

        gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);

        for loc in [position, texture_coord].into_iter().flatten() {
            gl.disable_vertex_attrib_array(loc);
        }
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
    }

    pub fn destroy(self, gl: &G) {
        gl.delete_buffer(self.vbo);
    }
}
