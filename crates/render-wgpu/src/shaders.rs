/// Main colour shader. Entry points: `vs_main`, `fs_phong`, `fs_basic`,
/// `fs_shadow_catcher`.
///
/// Lights are unattenuated point lights. Shadow depth is stored as the
/// normalized light distance, so `shadow_params.x` (bias) is in the same
/// units as the map.
pub const SCENE_SHADER: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    light_view_proj: mat4x4<f32>,
    // w = 1 when this light has a shadow map
    key_light_position: vec4<f32>,
    key_light_color: vec4<f32>,
    fill_light_position: vec4<f32>,
    fill_light_color: vec4<f32>,
    camera_position: vec4<f32>,
    // bias, texel size, near, far
    shadow_params: vec4<f32>,
    // x = tone mapping enabled, y = exposure
    options: vec4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    // a = opacity
    color: vec4<f32>,
    // w = shininess; w < 0 disables shadow receiving
    specular: vec4<f32>,
};

@group(0) @binding(0) var<uniform> frame: Frame;
@group(0) @binding(1) var shadow_map: texture_depth_2d;
@group(0) @binding(2) var shadow_sampler: sampler_comparison;
@group(1) @binding(0) var<uniform> object: Object;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(vertex.position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (object.normal_matrix * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

fn uncharted2_curve(x: vec3<f32>) -> vec3<f32> {
    return max(
        ((x * (0.15 * x + 0.05) + 0.004) / (x * (0.15 * x + 0.50) + 0.06)) - 0.02 / 0.30,
        vec3<f32>(0.0),
    );
}

fn tone_map(color: vec3<f32>) -> vec3<f32> {
    if (frame.options.x < 0.5) {
        return color;
    }
    let mapped = uncharted2_curve(color * frame.options.y) / uncharted2_curve(vec3<f32>(1.0));
    return clamp(mapped, vec3<f32>(0.0), vec3<f32>(1.0));
}

// Fraction of the key light reaching this point, 3x3 PCF.
fn key_light_visibility(world_position: vec3<f32>) -> f32 {
    let light_clip = frame.light_view_proj * vec4<f32>(world_position, 1.0);
    let ndc = light_clip.xyz / max(light_clip.w, 1e-6);
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5);

    let near = frame.shadow_params.z;
    let far = frame.shadow_params.w;
    let dist = length(world_position - frame.key_light_position.xyz);
    let reference = (dist - near) / (far - near) + frame.shadow_params.x;

    let texel = frame.shadow_params.y;
    var lit = 0.0;
    for (var y = -1; y <= 1; y++) {
        for (var x = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y)) * texel;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, reference);
        }
    }
    lit /= 9.0;

    let outside = light_clip.w <= 0.0
        || any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0))
        || reference > 1.0;
    let has_shadow = frame.key_light_position.w > 0.5;
    return select(lit, 1.0, outside || !has_shadow);
}

fn facing_normal(normal: vec3<f32>, front: bool) -> vec3<f32> {
    let n = normalize(normal);
    return select(-n, n, front);
}

fn blinn_phong(
    light_position: vec3<f32>,
    radiance: vec3<f32>,
    position: vec3<f32>,
    normal: vec3<f32>,
    view_dir: vec3<f32>,
) -> vec3<f32> {
    let l = normalize(light_position - position);
    let n_dot_l = max(dot(normal, l), 0.0);
    let h = normalize(l + view_dir);
    let n_dot_h = max(dot(normal, h), 0.0);
    let l_dot_h = max(dot(l, h), 0.0);

    let shininess = abs(object.specular.w);
    let fresnel = object.specular.rgb + (vec3<f32>(1.0) - object.specular.rgb) * pow(1.0 - l_dot_h, 5.0);
    let specular = fresnel * 0.25 * (shininess * 0.5 + 1.0) * pow(n_dot_h, shininess);

    return (object.color.rgb + specular) * radiance * n_dot_l;
}

@fragment
fn fs_phong(in: VertexOutput, @builtin(front_facing) is_front: bool) -> @location(0) vec4<f32> {
    let normal = facing_normal(in.world_normal, is_front);
    let view_dir = normalize(frame.camera_position.xyz - in.world_position);

    var visibility = key_light_visibility(in.world_position);
    if (object.specular.w < 0.0) {
        visibility = 1.0;
    }

    let key = blinn_phong(
        frame.key_light_position.xyz,
        frame.key_light_color.rgb,
        in.world_position,
        normal,
        view_dir,
    ) * visibility;
    let fill = blinn_phong(
        frame.fill_light_position.xyz,
        frame.fill_light_color.rgb,
        in.world_position,
        normal,
        view_dir,
    );
    return vec4<f32>(tone_map(key + fill), object.color.a);
}

@fragment
fn fs_basic(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(tone_map(object.color.rgb), object.color.a);
}

@fragment
fn fs_shadow_catcher(in: VertexOutput) -> @location(0) vec4<f32> {
    let shadowed = 1.0 - key_light_visibility(in.world_position);
    return vec4<f32>(tone_map(object.color.rgb), object.color.a * shadowed);
}
"#;

/// Depth-only shadow shader. Writes normalized distance from the light.
pub const SHADOW_SHADER: &str = r#"
struct ShadowCamera {
    light_view_proj: mat4x4<f32>,
    light_position: vec4<f32>,
    // near, far
    range: vec4<f32>,
};

struct Object {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    specular: vec4<f32>,
};

@group(0) @binding(0) var<uniform> shadow_camera: ShadowCamera;
@group(1) @binding(0) var<uniform> object: Object;

@vertex
fn vs_shadow(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    let world = object.model * vec4<f32>(position, 1.0);
    var clip = shadow_camera.light_view_proj * world;
    let near = shadow_camera.range.x;
    let far = shadow_camera.range.y;
    let depth = (length(world.xyz - shadow_camera.light_position.xyz) - near) / (far - near);
    clip.z = depth * clip.w;
    return clip;
}
"#;
