use super::SurfaceErrorAction;

/// Picks the format reported as the preferred canvas format.
pub fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    let preferred = if prefer_srgb {
        [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        [
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Rgba8Unorm,
        ]
    };
    for f in preferred {
        if caps.formats.contains(&f) {
            return Some(f);
        }
    }

    Some(caps.formats[0])
}

/// Resolves a requested alpha mode against what the surface supports.
///
/// Browsers accept `opaque` and `premultiplied` everywhere, native backends
/// often support only one of them. An unsupported request falls back to the
/// nearest supported mode: the other blending mode first, then whatever the
/// surface lists first.
pub fn choose_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    use wgpu::CompositeAlphaMode as A;

    let Some(requested) = requested else {
        return supported.first().copied().unwrap_or(A::Auto);
    };
    if requested == A::Auto || supported.contains(&requested) {
        return requested;
    }

    let fallbacks: &[A] = match requested {
        A::Opaque => &[A::Inherit, A::PostMultiplied, A::PreMultiplied],
        A::PreMultiplied => &[A::PostMultiplied, A::Inherit, A::Opaque],
        A::PostMultiplied => &[A::PreMultiplied, A::Inherit, A::Opaque],
        A::Inherit => &[A::Opaque, A::PreMultiplied, A::PostMultiplied],
        A::Auto => &[],
    };

    fallbacks
        .iter()
        .copied()
        .find(|m| supported.contains(m))
        .or_else(|| supported.first().copied())
        .unwrap_or(A::Auto)
}

pub(crate) fn map_surface_error(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}
