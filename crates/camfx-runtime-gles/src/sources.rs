//! Built-in GLSL ES 1.00 sources for the filter set.
use camfx_core::{FilterCode, TextureTarget};

pub const ATTR_POSITION: &str = "aPosition";
pub const ATTR_TEXTURE_COORD: &str = "aTextureCoord";
pub const UNIFORM_TEXTURE: &str = "uTexture";
pub const UNIFORM_INVERTED: &str = "inverted";

pub const FULLSCREEN_VERT: &str = r#"attribute vec4 aPosition;
attribute vec4 aTextureCoord;
varying vec2 vTextureCoord;
void main() {
    gl_Position = aPosition;
    vTextureCoord = aTextureCoord.xy;
}
"#;

const EXTERNAL_PREAMBLE: &str = r#"#extension GL_OES_EGL_image_external : require
precision mediump float;
uniform samplerExternalOES uTexture;
"#;

const TEXTURE_2D_PREAMBLE: &str = r#"precision mediump float;
uniform sampler2D uTexture;
"#;

const PASSTHROUGH_BODY: &str = r#"varying vec2 vTextureCoord;
void main() {
    gl_FragColor = texture2D(uTexture, vTextureCoord);
}
"#;

const GRAYSCALE_BODY: &str = r#"varying vec2 vTextureCoord;
void main() {
    vec4 color = texture2D(uTexture, vTextureCoord);
    float luma = dot(color.rgb, vec3(0.299, 0.587, 0.114));
    gl_FragColor = vec4(vec3(luma), color.a);
}
"#;

const NEGATIVE_BODY: &str = r#"varying vec2 vTextureCoord;
void main() {
    vec4 color = texture2D(uTexture, vTextureCoord);
    gl_FragColor = vec4(1.0 - color.rgb, color.a);
}
"#;

const BLACK_AND_WHITE_BODY: &str = r#"varying vec2 vTextureCoord;
uniform int inverted;
void main() {
    vec4 color = texture2D(uTexture, vTextureCoord);
    float luma = dot(color.rgb, vec3(0.299, 0.587, 0.114));
    float bw = step(0.5, luma);
    if (inverted == 1) {
        bw = 1.0 - bw;
    }
    gl_FragColor = vec4(vec3(bw), color.a);
}
"#;

/// Fragment source for `code`, sampling a texture bound as `target`.
pub fn fragment_source(code: FilterCode, target: TextureTarget) -> String {
    let preamble = match target {
        TextureTarget::External => EXTERNAL_PREAMBLE,
        TextureTarget::Texture2D => TEXTURE_2D_PREAMBLE,
    };
    let body = match code {
        FilterCode::Passthrough => PASSTHROUGH_BODY,
        FilterCode::Grayscale => GRAYSCALE_BODY,
        FilterCode::Negative => NEGATIVE_BODY,
        FilterCode::BlackAndWhite => BLACK_AND_WHITE_BODY,
    };
    format!("{preamble}{body}")
}

/// Uniforms a variant binds on top of the common set.
pub fn extra_uniforms(code: FilterCode) -> &'static [&'static str] {
    match code {
        FilterCode::BlackAndWhite => &[UNIFORM_INVERTED],
        FilterCode::Passthrough | FilterCode::Grayscale | FilterCode::Negative => &[],
    }
}
