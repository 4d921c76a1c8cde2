/// WGSL shader that blits the uploaded framebuffer to the surface.
///
/// The vertex stage emits one oversized triangle from `vertex_index` alone,
/// so no vertex buffer is bound.
pub const BLIT_SHADER: &str = r#"
struct Uniforms {
    scale: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(0) @binding(1)
var frame_texture: texture_2d<f32>;

@group(0) @binding(2)
var frame_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let ndc = vec2<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0) * uniforms.scale;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_blit(in: VertexOutput) -> @location(0) vec4<f32> {
    if (in.uv.x > 1.0 || in.uv.y > 1.0) {
        return vec4<f32>(0.0, 0.0, 0.0, 1.0);
    }
    return textureSample(frame_texture, frame_sampler, in.uv);
}
"#;
