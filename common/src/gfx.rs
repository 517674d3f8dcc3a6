use std::path::Path;

use windows::{
    core::PCSTR,
    Win32::Foundation::E_POINTER,
    Win32::Graphics::{
        Direct3D::{
            Fxc::{D3DCompile, D3DCOMPILE_ENABLE_STRICTNESS},
            ID3DBlob,
        },
        Direct3D11::{
            ID3D11Buffer, ID3D11Device, ID3D11ShaderResourceView, ID3D11Texture2D,
            D3D11_BIND_CONSTANT_BUFFER, D3D11_BIND_FLAG, D3D11_BIND_SHADER_RESOURCE,
            D3D11_BUFFER_DESC, D3D11_SUBRESOURCE_DATA, D3D11_TEXTURE2D_DESC, D3D11_USAGE_DEFAULT,
        },
        Dxgi::{
            Common::{DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_SAMPLE_DESC},
            DXGIGetDebugInterface1, IDXGIDebug1, DXGI_DEBUG_ALL, DXGI_DEBUG_RLO_DETAIL,
            DXGI_DEBUG_RLO_IGNORE_INTERNAL,
        },
    },
};

use crate::{
    error::{Error, Result},
    shader::{ShaderCompiler, ShaderSource},
    util::AsCString,
};

/// Compiles HLSL source files with the FXC compiler at runtime.
#[derive(Clone, Copy, Debug)]
pub struct FxcCompiler {
    flags: u32,
}

impl Default for FxcCompiler {
    fn default() -> Self {
        Self {
            flags: D3DCOMPILE_ENABLE_STRICTNESS,
        }
    }
}

impl ShaderCompiler for FxcCompiler {
    fn compile(&self, source: &ShaderSource) -> Result<Vec<u8>> {
        let code = std::fs::read(source.path()).map_err(|e| Error::ShaderLoad {
            stage: source.stage,
            path: source.path.clone(),
            source: e,
        })?;

        let source_name = source.path.display().to_string().as_c_string();
        let entry_point = source.entry_point.as_str().as_c_string();
        let target = source.target.as_str().as_c_string();

        let mut blob: Option<ID3DBlob> = None;
        let mut error_blob: Option<ID3DBlob> = None;

        let result = unsafe {
            D3DCompile(
                code.as_ptr() as *const _,
                code.len(),
                PCSTR(source_name.as_ptr() as _),
                None,
                None,
                PCSTR(entry_point.as_ptr() as _),
                PCSTR(target.as_ptr() as _),
                self.flags,
                0,
                &mut blob,
                Some(&mut error_blob),
            )
        };

        if let Err(e) = result {
            let diagnostics = match error_blob {
                Some(error_blob) => String::from_utf8_lossy(blob_bytes(&error_blob))
                    .trim_end_matches('\0')
                    .to_string(),
                None => format!("Error loading {} shader: {e}", source.stage),
            };
            return Err(Error::ShaderCompilation {
                stage: source.stage,
                diagnostics,
            });
        }

        let blob = blob.ok_or_else(|| Error::ShaderCompilation {
            stage: source.stage,
            diagnostics: format!("Error loading {} shader", source.stage),
        })?;

        log::debug!(
            "compiled {} ({}, {}): {} bytes",
            source.path.display(),
            source.entry_point,
            source.target,
            unsafe { blob.GetBufferSize() }
        );

        Ok(blob_bytes(&blob).to_vec())
    }
}

/// Error for a create call that succeeded without writing its out-parameter.
pub fn missing_object() -> windows::core::Error {
    E_POINTER.into()
}

pub fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            blob.GetBufferPointer() as *const u8,
            blob.GetBufferSize(),
        )
    }
}

/// Creates a default-usage buffer initialised with `data`.
pub fn create_buffer<T: bytemuck::Pod>(
    device: &ID3D11Device,
    bind_flags: D3D11_BIND_FLAG,
    data: &[T],
) -> windows::core::Result<ID3D11Buffer> {
    let bytes: &[u8] = bytemuck::cast_slice(data);

    let desc = D3D11_BUFFER_DESC {
        ByteWidth: bytes.len() as u32,
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: bind_flags.0 as u32,
        ..Default::default()
    };

    let initial_data = D3D11_SUBRESOURCE_DATA {
        pSysMem: bytes.as_ptr() as *const _,
        ..Default::default()
    };

    let mut buffer: Option<ID3D11Buffer> = None;
    unsafe { device.CreateBuffer(&desc, Some(&initial_data), Some(&mut buffer)) }?;
    buffer.ok_or_else(missing_object)
}

/// Creates an uninitialised constant buffer sized for one `T`.
pub fn create_constant_buffer<T: bytemuck::Pod>(
    device: &ID3D11Device,
) -> windows::core::Result<ID3D11Buffer> {
    let desc = D3D11_BUFFER_DESC {
        ByteWidth: std::mem::size_of::<T>() as u32,
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: D3D11_BIND_CONSTANT_BUFFER.0 as u32,
        ..Default::default()
    };

    let mut buffer: Option<ID3D11Buffer> = None;
    unsafe { device.CreateBuffer(&desc, None, Some(&mut buffer)) }?;
    buffer.ok_or_else(missing_object)
}

/// Decodes an image file into an RGBA8 texture and a view over it.
pub fn load_texture(
    device: &ID3D11Device,
    path: &Path,
) -> Result<(ID3D11Texture2D, ID3D11ShaderResourceView)> {
    let image = image::open(path)
        .map_err(|e| Error::Texture {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgba8();
    let (width, height) = image.dimensions();
    log::info!("loaded texture {}: {width}x{height}", path.display());

    let desc = D3D11_TEXTURE2D_DESC {
        Width: width,
        Height: height,
        MipLevels: 1,
        ArraySize: 1,
        Format: DXGI_FORMAT_R8G8B8A8_UNORM,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: D3D11_BIND_SHADER_RESOURCE.0 as u32,
        CPUAccessFlags: 0,
        MiscFlags: 0,
    };

    let initial_data = D3D11_SUBRESOURCE_DATA {
        pSysMem: image.as_raw().as_ptr() as *const _,
        SysMemPitch: width * 4,
        SysMemSlicePitch: 0,
    };

    let mut texture: Option<ID3D11Texture2D> = None;
    unsafe { device.CreateTexture2D(&desc, Some(&initial_data), Some(&mut texture)) }
        .map_err(Error::graphics("create texture buffer"))?;
    let texture = texture
        .ok_or_else(missing_object)
        .map_err(Error::graphics("create texture buffer"))?;

    let mut view: Option<ID3D11ShaderResourceView> = None;
    unsafe { device.CreateShaderResourceView(&texture, None, Some(&mut view)) }
        .map_err(Error::graphics("create texture view"))?;
    let view = view
        .ok_or_else(missing_object)
        .map_err(Error::graphics("create texture view"))?;

    Ok((texture, view))
}

/// Dumps device objects that are still alive to the debugger output.
///
/// Only does anything in debug builds with the graphics tools installed.
pub fn report_live_objects() {
    if cfg!(debug_assertions) {
        unsafe {
            if let Ok(dxgi_debug) = DXGIGetDebugInterface1::<IDXGIDebug1>(0) {
                let _ = dxgi_debug.ReportLiveObjects(
                    DXGI_DEBUG_ALL,
                    DXGI_DEBUG_RLO_DETAIL | DXGI_DEBUG_RLO_IGNORE_INTERNAL,
                );
            }
        }
    }
}
