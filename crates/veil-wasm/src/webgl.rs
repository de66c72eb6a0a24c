//! WebGL surface for the noise veil.
//!
//! The fragment shader evaluates the same field as [`veil_core::shade`]: the
//! shared constants are injected as `#define`s and the simplex noise uses the
//! same mod-289 hash as `veil_core::noise`. A single full-screen quad is
//! drawn per frame with straight (non-premultiplied) alpha.

use veil_core::field::{
    DARK_ACCENT_BLEND, DARK_ALPHA, DITHER, LIGHT_ACCENT_BLEND, LIGHT_ALPHA, SPATIAL_SCALE,
    TIME_SCALE, VIGNETTE_STRENGTH,
};
use veil_core::{DrawSurface, RenderState, SurfaceSize};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, WebGlBuffer, WebGlProgram, WebGlRenderingContext as GL, WebGlShader,
    WebGlUniformLocation,
};

const VERTEX_SRC: &str = r#"
attribute vec2 a_position;
void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

const FRAGMENT_BODY: &str = r#"
uniform vec2 u_resolution;
uniform float u_time;
uniform vec3 u_base;
uniform vec3 u_accent;
uniform float u_blend;
uniform float u_alpha;

vec3 mod289(vec3 x) { return x - floor(x * (1.0 / 289.0)) * 289.0; }
vec2 mod289(vec2 x) { return x - floor(x * (1.0 / 289.0)) * 289.0; }
vec3 permute(vec3 x) { return mod289(((x * 34.0) + 1.0) * x); }

float snoise(vec2 v) {
    const vec4 C = vec4(0.211324865405187, 0.366025403784439,
                        -0.577350269189626, 0.024390243902439);
    vec2 i = floor(v + dot(v, C.yy));
    vec2 x0 = v - i + dot(i, C.xx);
    vec2 i1 = (x0.x > x0.y) ? vec2(1.0, 0.0) : vec2(0.0, 1.0);
    vec4 x12 = x0.xyxy + C.xxzz;
    x12.xy -= i1;
    i = mod289(i);
    vec3 p = permute(permute(i.y + vec3(0.0, i1.y, 1.0)) + i.x + vec3(0.0, i1.x, 1.0));
    vec3 m = max(0.5 - vec3(dot(x0, x0), dot(x12.xy, x12.xy), dot(x12.zw, x12.zw)), 0.0);
    m = m * m;
    m = m * m;
    vec3 x = 2.0 * fract(p * C.www) - 1.0;
    vec3 h = abs(x) - 0.5;
    vec3 a0 = x - floor(x + 0.5);
    m *= 1.79284291400159 - 0.85373472095314 * (a0 * a0 + h * h);
    vec3 g;
    g.x = a0.x * x0.x + h.x * x0.y;
    g.yz = a0.yz * x12.xz + h.yz * x12.yw;
    return 130.0 * dot(m, g);
}

void main() {
    vec2 uv = gl_FragCoord.xy / u_resolution;
    float time = u_time * TIME_SCALE;
    vec2 p = uv * SPATIAL_SCALE;

    float n = 0.0;
    n += snoise(p + time * 0.1) * 0.3;
    n += snoise(p * 2.0 + time * 0.15) * 0.5 * 0.3;
    n += snoise(p * 4.0 - time * 0.08) * 0.25 * 0.2;
    n = n * 0.5 + 0.5;
    n *= 1.0 - length(uv - 0.5) * VIGNETTE_STRENGTH;

    vec3 color = mix(u_base, u_accent, n * u_blend);
    color += (n - 0.5) * DITHER;
    gl_FragColor = vec4(clamp(color, 0.0, 1.0), u_alpha);
}
"#;

/// Two triangles covering clip space, drawn as a strip.
const QUAD: [f32; 8] = [-1.0, -1.0, 1.0, -1.0, -1.0, 1.0, 1.0, 1.0];

/// Full fragment shader source with the field constants defined.
pub(crate) fn fragment_source() -> String {
    format!(
        "precision mediump float;\n\
         #define TIME_SCALE {TIME_SCALE:?}\n\
         #define SPATIAL_SCALE {SPATIAL_SCALE:?}\n\
         #define VIGNETTE_STRENGTH {VIGNETTE_STRENGTH:?}\n\
         #define DITHER {DITHER:?}\n\
         {FRAGMENT_BODY}"
    )
}

struct Uniforms {
    resolution: Option<WebGlUniformLocation>,
    time: Option<WebGlUniformLocation>,
    base: Option<WebGlUniformLocation>,
    accent: Option<WebGlUniformLocation>,
    blend: Option<WebGlUniformLocation>,
    alpha: Option<WebGlUniformLocation>,
}

impl Uniforms {
    fn locate(gl: &GL, program: &WebGlProgram) -> Self {
        Self {
            resolution: gl.get_uniform_location(program, "u_resolution"),
            time: gl.get_uniform_location(program, "u_time"),
            base: gl.get_uniform_location(program, "u_base"),
            accent: gl.get_uniform_location(program, "u_accent"),
            blend: gl.get_uniform_location(program, "u_blend"),
            alpha: gl.get_uniform_location(program, "u_alpha"),
        }
    }
}

/// GPU resources owned by one mounted veil.
pub struct WebGlVeil {
    canvas: HtmlCanvasElement,
    gl: GL,
    program: WebGlProgram,
    shaders: [WebGlShader; 2],
    buffer: WebGlBuffer,
    uniforms: Uniforms,
    size: SurfaceSize,
}

impl WebGlVeil {
    /// Create a WebGL context on `canvas` and build the shader program.
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, String> {
        let gl = canvas
            .get_context_with_context_options("webgl", &context_options()?.into())
            .map_err(|e| format!("webgl context failed: {e:?}"))?
            .ok_or_else(|| "webgl unsupported".to_string())?
            .dyn_into::<GL>()
            .map_err(|_| "webgl context has unexpected type".to_string())?;

        let (program, shaders) = build_program(
            |src, kind| compile_shader(&gl, src, kind),
            |vertex, fragment| link_program(&gl, vertex, fragment),
            |shader| gl.delete_shader(Some(shader)),
        )?;

        let Some(buffer) = gl.create_buffer() else {
            delete_program(&gl, &program, &shaders);
            return Err("could not create buffer".to_string());
        };
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&buffer));
        let vertices = js_sys::Float32Array::from(&QUAD[..]);
        gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &vertices, GL::STATIC_DRAW);

        let position = gl.get_attrib_location(&program, "a_position");
        if position < 0 {
            gl.delete_buffer(Some(&buffer));
            delete_program(&gl, &program, &shaders);
            return Err("a_position attribute missing".to_string());
        }
        gl.enable_vertex_attrib_array(position as u32);
        gl.vertex_attrib_pointer_with_i32(position as u32, 2, GL::FLOAT, false, 0, 0);

        let uniforms = Uniforms::locate(&gl, &program);
        log::debug!("webgl veil program linked");

        Ok(Self {
            canvas: canvas.clone(),
            gl,
            program,
            shaders,
            buffer,
            uniforms,
            size: SurfaceSize::default(),
        })
    }
}

impl DrawSurface for WebGlVeil {
    type Frame = RenderState;

    fn resize(&mut self, size: SurfaceSize) {
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        self.gl.viewport(0, 0, size.width as i32, size.height as i32);
        self.size = size;
    }

    fn present(&mut self, state: &RenderState) {
        if self.size.is_empty() {
            return;
        }
        let gl = &self.gl;
        let u = &self.uniforms;
        let (blend, alpha) = if state.is_dark {
            (DARK_ACCENT_BLEND, DARK_ALPHA)
        } else {
            (LIGHT_ACCENT_BLEND, LIGHT_ALPHA)
        };

        gl.clear_color(0.0, 0.0, 0.0, 0.0);
        gl.clear(GL::COLOR_BUFFER_BIT);
        gl.use_program(Some(&self.program));
        gl.uniform2f(
            u.resolution.as_ref(),
            self.size.width as f32,
            self.size.height as f32,
        );
        gl.uniform1f(u.time.as_ref(), state.elapsed);
        gl.uniform3f(u.base.as_ref(), state.base.r, state.base.g, state.base.b);
        gl.uniform3f(u.accent.as_ref(), state.accent.r, state.accent.g, state.accent.b);
        gl.uniform1f(u.blend.as_ref(), blend);
        gl.uniform1f(u.alpha.as_ref(), alpha);
        gl.draw_arrays(GL::TRIANGLE_STRIP, 0, 4);
    }

    fn release(&mut self) {
        let gl = &self.gl;
        gl.use_program(None);
        gl.delete_buffer(Some(&self.buffer));
        delete_program(gl, &self.program, &self.shaders);
        self.size = SurfaceSize::default();
        log::debug!("webgl veil released");
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Straight alpha, matching `FieldRaster`: in light mode the white base
/// at alpha 0.2 shows as a faint 20% wash, not an opaque white layer.
const CONTEXT_OPTIONS: [(&str, bool); 5] = [
    ("alpha", true),
    ("antialias", false),
    ("depth", false),
    ("stencil", false),
    ("premultipliedAlpha", false),
];

fn context_options() -> Result<js_sys::Object, String> {
    let options = js_sys::Object::new();
    for (key, value) in CONTEXT_OPTIONS {
        js_sys::Reflect::set(&options, &JsValue::from_str(key), &JsValue::from_bool(value))
            .map_err(|e| format!("context option {key}: {e:?}"))?;
    }
    Ok(options)
}

/// Compile both stages and link them. Shaders created before a failure
/// are passed to `discard`.
fn build_program<Sh, P>(
    compile: impl Fn(&str, u32) -> Result<Sh, String>,
    link: impl FnOnce(&Sh, &Sh) -> Result<P, String>,
    mut discard: impl FnMut(&Sh),
) -> Result<(P, [Sh; 2]), String> {
    let vertex = compile(VERTEX_SRC, GL::VERTEX_SHADER)?;
    let fragment = match compile(&fragment_source(), GL::FRAGMENT_SHADER) {
        Ok(shader) => shader,
        Err(e) => {
            discard(&vertex);
            return Err(e);
        }
    };
    match link(&vertex, &fragment) {
        Ok(program) => Ok((program, [vertex, fragment])),
        Err(e) => {
            discard(&vertex);
            discard(&fragment);
            Err(e)
        }
    }
}

fn delete_program(gl: &GL, program: &WebGlProgram, shaders: &[WebGlShader; 2]) {
    for shader in shaders {
        gl.detach_shader(program, shader);
        gl.delete_shader(Some(shader));
    }
    gl.delete_program(Some(program));
}

fn compile_shader(gl: &GL, src: &str, kind: u32) -> Result<WebGlShader, String> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| "could not create shader".to_string())?;
    gl.shader_source(&shader, src);
    gl.compile_shader(&shader);
    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if !ok {
        let info = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        return Err(format!("shader compile failed: {info}"));
    }
    Ok(shader)
}

fn link_program(gl: &GL, vertex: &WebGlShader, fragment: &WebGlShader) -> Result<WebGlProgram, String> {
    let program = gl
        .create_program()
        .ok_or_else(|| "could not create program".to_string())?;
    gl.attach_shader(&program, vertex);
    gl.attach_shader(&program, fragment);
    gl.link_program(&program);
    let ok = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if !ok {
        let info = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        return Err(format!("program link failed: {info}"));
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;

    #[test]
    fn fragment_defines_come_first() {
        let src = fragment_source();
        assert!(src.starts_with("precision mediump float;\n"));
        assert!(src.contains("#define TIME_SCALE 0.05\n"));
        assert!(src.contains("#define SPATIAL_SCALE 2.0\n"));
        assert!(src.contains("#define VIGNETTE_STRENGTH 0.3\n"));
        assert!(src.contains("#define DITHER 0.02\n"));
        assert!(src.contains("void main()"));
    }

    #[test]
    fn context_uses_straight_alpha() {
        let premultiplied = CONTEXT_OPTIONS
            .iter()
            .find(|(key, _)| *key == "premultipliedAlpha")
            .map(|&(_, value)| value);
        assert_eq!(premultiplied, Some(false));
    }

    /// Build with fake stages; `fail` names the step that errors.
    fn build_with(fail: Option<&str>) -> (Result<(String, [String; 2]), String>, Vec<String>) {
        let discarded = RefCell::new(Vec::new());
        let result = build_program(
            |_src, kind| {
                let name = if kind == GL::VERTEX_SHADER { "vertex" } else { "fragment" };
                if fail == Some(name) {
                    Err(format!("{name} failed"))
                } else {
                    Ok(name.to_string())
                }
            },
            |v, f| {
                if fail == Some("link") {
                    Err("link failed".to_string())
                } else {
                    Ok(format!("{v}+{f}"))
                }
            },
            |shader: &String| discarded.borrow_mut().push(shader.clone()),
        );
        (result, discarded.into_inner())
    }

    #[test]
    fn successful_build_keeps_both_shaders() {
        let (result, discarded) = build_with(None);
        let (program, shaders) = result.unwrap();
        assert_eq!(program, "vertex+fragment");
        assert_eq!(shaders, ["vertex".to_string(), "fragment".to_string()]);
        assert!(discarded.is_empty());
    }

    #[test]
    fn vertex_failure_creates_nothing() {
        let (result, discarded) = build_with(Some("vertex"));
        assert_eq!(result.unwrap_err(), "vertex failed");
        assert!(discarded.is_empty());
    }

    #[test]
    fn fragment_failure_discards_vertex() {
        let (result, discarded) = build_with(Some("fragment"));
        assert_eq!(result.unwrap_err(), "fragment failed");
        assert_eq!(discarded, vec!["vertex".to_string()]);
    }

    #[test]
    fn link_failure_discards_both_shaders() {
        let (result, discarded) = build_with(Some("link"));
        assert_eq!(result.unwrap_err(), "link failed");
        assert_eq!(discarded, vec!["vertex".to_string(), "fragment".to_string()]);
    }

    #[test]
    fn quad_covers_clip_space() {
        let xs: Vec<f32> = QUAD.iter().step_by(2).copied().collect();
        let ys: Vec<f32> = QUAD.iter().skip(1).step_by(2).copied().collect();
        for axis in [xs, ys] {
            assert!(axis.contains(&-1.0) && axis.contains(&1.0));
        }
    }
}
