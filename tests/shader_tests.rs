// SPDX-License-Identifier: GPL-3.0-only

//! WGSL kernel validation

use yuv2rgba::constants::{WORKGROUP_SIZE, fixed_point as fp};
use yuv2rgba::shaders::yuv_convert::{YUV_TO_RGBA_SHADER, YuvConvertParams};

fn parse() -> naga::Module {
    naga::front::wgsl::parse_str(YUV_TO_RGBA_SHADER).expect("WGSL should parse")
}

#[test]
fn test_shader_validates() {
    let module = parse();
    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    );
    validator
        .validate(&module)
        .expect("WGSL should pass validation");
}

#[test]
fn test_entry_point() {
    let module = parse();
    assert_eq!(module.entry_points.len(), 1);

    let entry = &module.entry_points[0];
    assert_eq!(entry.name, "main");
    assert_eq!(entry.stage, naga::ShaderStage::Compute);
    assert_eq!(entry.workgroup_size, [WORKGROUP_SIZE, WORKGROUP_SIZE, 1]);
}

#[test]
fn test_params_size_matches_host() {
    let module = parse();
    let params = module
        .global_variables
        .iter()
        .find(|(_, var)| var.name.as_deref() == Some("params"))
        .map(|(_, var)| var.ty)
        .expect("params uniform");

    let size = module.types[params].inner.size(module.to_ctx());
    assert_eq!(size as usize, std::mem::size_of::<YuvConvertParams>());
}

#[test]
fn test_shader_uses_host_coefficients() {
    let expected = [
        format!("v * {} / {} - {}", fp::R_V_MUL, fp::R_V_DIV, fp::R_OFFSET),
        format!("u * {} / {} + {}", fp::G_U_MUL, fp::G_DIV, fp::G_U_OFFSET),
        format!("v * {} / {} + {}", fp::G_V_MUL, fp::G_DIV, fp::G_V_OFFSET),
        format!("u * {} / {} - {}", fp::B_U_MUL, fp::B_U_DIV, fp::B_OFFSET),
    ];
    for term in expected {
        assert!(
            YUV_TO_RGBA_SHADER.contains(&term),
            "shader is missing `{}`",
            term
        );
    }
}
