use camfx_core::{FilterCode, FilterError, FilterSettings, ShaderError, Size, TextureTarget};

use crate::context::DrawContext;
use crate::gl::GlApi;
use crate::quad::FullscreenQuad;
use crate::shader::ShaderProgram;
use crate::sources::{self, FULLSCREEN_VERT, UNIFORM_INVERTED};
use crate::texture::ExternalTexture;

/// One filter: its linked program, the quad it draws and the settings it draws with.
#[derive(Debug)]
pub struct FilterVariant<G: GlApi> {
    code: FilterCode,
    program: ShaderProgram<G>,
    quad: FullscreenQuad<G>,
    settings: FilterSettings,
}

impl<G: GlApi> FilterVariant<G> {
    /// Builds the variant for `code`. Requires a current context.
    pub fn new(gl: &G, code: FilterCode, target: TextureTarget) -> Result<Self, ShaderError> {
        let fragment = sources::fragment_source(code, target);
        let program = ShaderProgram::compile_and_link(
            gl,
            FULLSCREEN_VERT,
            &fragment,
            sources::extra_uniforms(code),
        )?;
        let quad = match FullscreenQuad::new(gl) {
            Ok(quad) => quad,
            Err(e) => {
                program.destroy(gl);
                return Err(e);
            }
        };

        Ok(Self {
            code,
            program,
            quad,
            settings: code.default_settings(),
        })
    }

    pub fn code(&self) -> FilterCode {
        self.code
    }

    pub fn settings(&self) -> FilterSettings {
        self.settings
    }

    pub fn program(&self) -> &ShaderProgram<G> {
        &self.program
    }

    /// Stores `settings` for subsequent draws.
    ///
    /// Settings tagged for another filter are a caller bug, never coerced. Debug builds panic;
    /// release builds log the error and keep the previous settings.
    pub fn attach(&mut self, settings: FilterSettings) -> Result<(), FilterError> {
        if settings.code() != self.code {
            tracing::error!(
                expected = %self.code,
                found = %settings.code(),
                "filter settings attached to the wrong variant"
            );
            if cfg!(debug_assertions) {
                panic!(
                    "{} settings attached to the {} variant",
                    settings.code(),
                    self.code
                );
            }
            return Err(FilterError::SettingsMismatch {
                expected: self.code,
                found: settings.code(),
            });
        }
        self.settings = settings;
        Ok(())
    }

    /// Draws `texture` over the whole viewport.
    pub fn draw(&self, dc: &DrawContext<'_, G>, texture: &ExternalTexture<G>, size: Size) {
        let gl = dc.gl();
        self.program.bind(gl);
        dc.set_viewport(size);

        texture.bind(gl, 0);
        let locations = self.program.locations();
        if let Some(sampler) = &locations.sampler {
            gl.uniform_1_i32(sampler, 0);
        }
        self.bind_extra_uniforms(gl);

        self.quad
            .draw(gl, locations.position, locations.texture_coord);
    }

    fn bind_extra_uniforms(&self, gl: &G) {
        match self.settings {
            FilterSettings::Passthrough | FilterSettings::Grayscale | FilterSettings::Negative => {}
            FilterSettings::BlackAndWhite { inverted } => {
                if let Some(loc) = self.program.extra_uniform(UNIFORM_INVERTED) {
                    gl.uniform_1_i32(loc, i32::from(inverted));
                }
            }
        }
    }

    pub fn destroy(self, gl: &G) {
        self.quad.destroy(gl);
        self.program.destroy(gl);
    }
}
