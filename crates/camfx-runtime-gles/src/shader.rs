use std::collections::HashMap;

use camfx_core::{ShaderError, ShaderStage};

use crate::gl::GlApi;
use crate::sources::{ATTR_POSITION, ATTR_TEXTURE_COORD, UNIFORM_TEXTURE};

/// Attribute/uniform locations resolved once at link time.
#[derive(Debug)]
pub struct Locations<G: GlApi> {
    pub position: Option<u32>,
    pub texture_coord: Option<u32>,
    pub sampler: Option<G::UniformLocation>,
    /// Variant-specific uniforms, keyed by name.
    pub extra: HashMap<&'static str, G::UniformLocation>,
}

/// A linked vertex+fragment program. Immutable once built.
#[derive(Debug)]
pub struct ShaderProgram<G: GlApi> {
    program: G::Program,
    vertex: G::Shader,
    fragment: G::Shader,
    locations: Locations<G>,
}

fn compile_stage<G: GlApi>(
    gl: &G,
    stage: ShaderStage,
    source: &str,
) -> Result<G::Shader, ShaderError> {
    let kind = match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    };
    let shader = gl
        .create_shader(kind)
        .map_err(|e| ShaderError::Create(format!("create_shader({stage}) failed: {e}")))?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(ShaderError::CompileFailed { stage, log });
    }
    Ok(shader)
}

impl<G: GlApi> ShaderProgram<G> {
    /// Compiles both stages, links them and caches the common locations plus `extra_uniforms`.
    ///
    /// Every GPU object created before a failure is deleted before returning.
    pub fn compile_and_link(
        gl: &G,
        vertex_source: &str,
        fragment_source: &str,
        extra_uniforms: &[&'static str],
    ) -> Result<Self, ShaderError> {
        let vertex = compile_stage(gl, ShaderStage::Vertex, vertex_source)?;
        let fragment = match compile_stage(gl, ShaderStage::Fragment, fragment_source) {
            Ok(fs) => fs,
            Err(e) => {
                gl.delete_shader(vertex);
                return Err(e);
            }
        };

        let program = match gl.create_program() {
            Ok(p) => p,
            Err(e) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(ShaderError::Create(format!("create_program failed: {e}")));
            }
        };
        gl.attach_shader(program, vertex);
        gl.attach_shader(program, fragment);
        gl.link_program(program);

        if !gl.get_program_link_status(program) {
            let log = gl.get_program_info_log(program);
            gl.detach_shader(program, vertex);
            gl.detach_shader(program, fragment);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            gl.delete_program(program);
            return Err(ShaderError::LinkFailed { log });
        }

        let extra = extra_uniforms
            .iter()
            .filter_map(|&name| gl.get_uniform_location(program, name).map(|loc| (name, loc)))
            .collect();
        let locations = Locations {
            position: gl.get_attrib_location(program, ATTR_POSITION),
            texture_coord: gl.get_attrib_location(program, ATTR_TEXTURE_COORD),
            sampler: gl.get_uniform_location(program, UNIFORM_TEXTURE),
            extra,
        };

        Ok(Self {
            program,
            vertex,
            fragment,
            locations,
        })
    }

    pub fn program(&self) -> G::Program {
        self.program
    }

    pub fn locations(&self) -> &Locations<G> {
        &self.locations
    }

    pub fn extra_uniform(&self, name: &str) -> Option<&G::UniformLocation> {
        self.locations.extra.get(name)
    }

    pub fn bind(&self, gl: &G) {
        gl.use_program(Some(self.program));
    }

    /// Frees the program and both shader objects.
    pub fn destroy(self, gl: &G) {
        gl.detach_shader(self.program, self.vertex);
        gl.detach_shader(self.program, self.fragment);
        gl.delete_shader(self.vertex);
        gl.delete_shader(self.fragment);
        gl.delete_program(self.program);
    }
}
