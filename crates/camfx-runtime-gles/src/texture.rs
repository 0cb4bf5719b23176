use camfx_core::{RenderError, TextureTarget};

use crate::gl::{GlApi, TEXTURE_EXTERNAL_OES};

pub fn gl_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::External => TEXTURE_EXTERNAL_OES,
        TextureTarget::Texture2D => glow::TEXTURE_2D,
    }
}

/// The single texture the frame producer writes into.
#[derive(Debug)]
pub struct ExternalTexture<G: GlApi> {
    id: G::Texture,
    target: TextureTarget,
}

impl<G: GlApi> ExternalTexture<G> {
    pub fn new(gl: &G, target: TextureTarget) -> Result<Self, RenderError> {
        let id = gl
            .create_texture()
            .map_err(|e| RenderError::GlCreate(format!("create_texture failed: {e}")))?;
        let t = gl_target(target);

        gl.bind_texture(t, Some(id));
        gl.tex_parameter_i32(t, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(t, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(t, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(t, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        gl.bind_texture(t, None);

        Ok(Self { id, target })
    }

    pub fn id(&self) -> G::Texture {
        self.id
    }

    pub fn target(&self) -> TextureTarget {
        self.target
    }

    /// Binds the texture to texture unit `unit` on its own target.
    pub fn bind(&self, gl: &G, unit: u32) {
        gl.active_texture(glow::TEXTURE0 + unit);
        gl.bind_texture(gl_target(self.target), Some(self.id));
    }

    pub fn destroy(self, gl: &G) {
        gl.delete_texture(self.id);
    }
}
