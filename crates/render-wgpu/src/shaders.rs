/// Frame uniforms shared by every pipeline (bind group 0).
const FRAME_UNIFORMS: &str = r#"
struct PointLight {
    position: vec4<f32>,
    ambient: vec4<f32>,
    diffuse: vec4<f32>,
    specular: vec4<f32>,
    attenuation: vec4<f32>,
};

struct Frame {
    view_proj: mat4x4<f32>,
    sky_view_proj: mat4x4<f32>,
    view_pos: vec4<f32>,
    // x: point light count
    counts: vec4<u32>,
    // x: shininess
    material: vec4<f32>,
    sun: PointLight,
    lights: array<PointLight, 32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
"#;

/// Textured Phong shading for floors, walls, doors and models.
const LIT_BODY: &str = r#"
@group(1) @binding(0) var t_diffuse: texture_2d<f32>;
@group(1) @binding(1) var t_specular: texture_2d<f32>;
@group(1) @binding(2) var s_material: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = frame.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize((model * vec4<f32>(vertex.normal, 0.0)).xyz);
    out.uv = vertex.uv;
    return out;
}

fn shade(
    light: PointLight,
    normal: vec3<f32>,
    frag_pos: vec3<f32>,
    view_dir: vec3<f32>,
    albedo: vec3<f32>,
    gloss: vec3<f32>,
) -> vec3<f32> {
    let to_light = light.position.xyz - frag_pos;
    let light_dir = normalize(to_light);
    let diff = max(dot(normal, light_dir), 0.0);
    let reflect_dir = reflect(-light_dir, normal);
    let spec = pow(max(dot(view_dir, reflect_dir), 0.0), frame.material.x);

    let d = length(to_light);
    let falloff = 1.0 / (light.attenuation.x + light.attenuation.y * d + light.attenuation.z * d * d);

    let ambient = light.ambient.rgb * albedo;
    let diffuse = light.diffuse.rgb * diff * albedo;
    let specular = light.specular.rgb * spec * gloss;
    return (ambient + diffuse + specular) * falloff;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(t_diffuse, s_material, in.uv);
    let gloss = textureSample(t_specular, s_material, in.uv).rgb;
    let normal = normalize(in.world_normal);
    let view_dir = normalize(frame.view_pos.xyz - in.world_pos);

    var color = shade(frame.sun, normal, in.world_pos, view_dir, albedo.rgb, gloss);
    for (var i = 0u; i < frame.counts.x; i = i + 1u) {
        color += shade(frame.lights[i], normal, in.world_pos, view_dir, albedo.rgb, gloss);
    }
    return vec4<f32>(color, albedo.a);
}
"#;

/// Flat white marker cubes at light positions.
const LAMP_BODY: &str = r#"
struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

@vertex
fn vs_lamp(@location(0) position: vec3<f32>, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    return frame.view_proj * model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_lamp() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
"#;

/// Cubemap sky drawn at the far plane.
const SKY_BODY: &str = r#"
@group(1) @binding(0) var t_sky: texture_cube<f32>;
@group(1) @binding(1) var s_sky: sampler;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_sky(@location(0) position: vec3<f32>) -> SkyOutput {
    let pos = frame.sky_view_proj * vec4<f32>(position, 1.0);
    var out: SkyOutput;
    // Depth is forced to 1.0.
    out.clip_position = pos.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    return textureSample(t_sky, s_sky, in.direction);
}
"#;

pub fn lit_shader() -> String {
    format!("{FRAME_UNIFORMS}{LIT_BODY}")
}

pub fn lamp_shader() -> String {
    format!("{FRAME_UNIFORMS}{LAMP_BODY}")
}

pub fn sky_shader() -> String {
    format!("{FRAME_UNIFORMS}{SKY_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_share_frame_layout() {
        for src in [lit_shader(), lamp_shader(), sky_shader()] {
            assert!(src.contains("var<uniform> frame: Frame"));
            assert!(src.contains("array<PointLight, 32>"));
        }
    }

    #[test]
    fn light_array_matches_cap() {
        assert!(FRAME_UNIFORMS.contains(&format!(
            "array<PointLight, {}>",
            tilescape_render::MAX_POINT_LIGHTS
        )));
    }
}
