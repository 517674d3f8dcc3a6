use common::{
    error::{Error, Result},
    gfx::{self, missing_object},
    shader::ShaderCompiler,
};
use windows::{
    core::PCSTR,
    Win32::{
        Foundation::{HMODULE, HWND},
        Graphics::{
            Direct3D::{
                D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST, D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL,
            },
            Direct3D11::{
                D3D11CreateDeviceAndSwapChain, ID3D11Buffer, ID3D11DepthStencilView, ID3D11Device,
                ID3D11DeviceContext, ID3D11InputLayout, ID3D11PixelShader,
                ID3D11RenderTargetView, ID3D11SamplerState, ID3D11ShaderResourceView,
                ID3D11Texture2D, ID3D11VertexShader, D3D11_BIND_DEPTH_STENCIL,
                D3D11_BIND_INDEX_BUFFER, D3D11_BIND_VERTEX_BUFFER, D3D11_CLEAR_DEPTH,
                D3D11_CLEAR_STENCIL, D3D11_COMPARISON_NEVER, D3D11_CREATE_DEVICE_DEBUG,
                D3D11_CREATE_DEVICE_FLAG, D3D11_FILTER_ANISOTROPIC, D3D11_FLOAT32_MAX,
                D3D11_INPUT_ELEMENT_DESC, D3D11_INPUT_PER_VERTEX_DATA, D3D11_SAMPLER_DESC,
                D3D11_SDK_VERSION, D3D11_TEXTURE2D_DESC, D3D11_TEXTURE_ADDRESS_WRAP,
                D3D11_USAGE_DEFAULT, D3D11_VIEWPORT,
            },
            Dxgi::{
                Common::{
                    DXGI_FORMAT_D24_UNORM_S8_UINT, DXGI_FORMAT_R32G32B32_FLOAT,
                    DXGI_FORMAT_R32G32_FLOAT, DXGI_FORMAT_R32_UINT, DXGI_FORMAT_R8G8B8A8_UNORM,
                    DXGI_MODE_DESC, DXGI_MODE_SCALING_UNSPECIFIED,
                    DXGI_MODE_SCANLINE_ORDER_UNSPECIFIED, DXGI_RATIONAL, DXGI_SAMPLE_DESC,
                },
                IDXGISwapChain, DXGI_PRESENT, DXGI_SWAP_CHAIN_DESC, DXGI_SWAP_EFFECT_DISCARD,
                DXGI_USAGE_RENDER_TARGET_OUTPUT,
            },
        },
    },
};

use crate::{
    config::DemoConfig,
    frame::{render_frame, FrameTarget},
    scene::{Camera, ObjectConstants, Scene, Vertex, CUBE_INDICES, CUBE_VERTICES},
    settings::Settings,
};

// Each group below owns one category of device objects. Rust drops struct
// fields in declaration order, so `GpuResources` lists them from the most
// dependent (sampler, views) to the least (device).

#[allow(unused)]
struct Material {
    sampler: ID3D11SamplerState,
    texture_view: ID3D11ShaderResourceView,
    texture: ID3D11Texture2D,
}

#[allow(unused)]
struct ObjectBuffers {
    constants: ID3D11Buffer,
    indices: ID3D11Buffer,
    vertices: ID3D11Buffer,
}

#[allow(unused)]
struct Pipeline {
    input_layout: ID3D11InputLayout,
    pixel_shader: ID3D11PixelShader,
    vertex_shader: ID3D11VertexShader,
}

#[allow(unused)]
struct RenderTargets {
    depth_stencil_view: ID3D11DepthStencilView,
    depth_stencil_buffer: ID3D11Texture2D,
    render_target_view: ID3D11RenderTargetView,
}

#[allow(unused)]
struct DeviceObjects {
    swap_chain: IDXGISwapChain,
    context: ID3D11DeviceContext,
    device: ID3D11Device,
}

struct GpuResources {
    material: Material,
    buffers: ObjectBuffers,
    pipeline: Pipeline,
    targets: RenderTargets,
    device: DeviceObjects,
    fullscreen: bool,
}

impl Drop for GpuResources {
    fn drop(&mut self) {
        unsafe {
            // A swap chain must leave exclusive mode before it is released.
            if self.fullscreen {
                let _ = self.device.swap_chain.SetFullscreenState(false, None);
            }
            // Unbind everything so the context holds no references of its own.
            self.device.context.ClearState();
            self.device.context.Flush();
        }
        log::debug!("releasing device resources");
    }
}

impl FrameTarget for GpuResources {
    fn clear(&mut self, color: [f32; 4]) {
        let context = &self.device.context;
        unsafe {
            context.ClearRenderTargetView(&self.targets.render_target_view, &color);
            context.ClearDepthStencilView(
                &self.targets.depth_stencil_view,
                (D3D11_CLEAR_DEPTH.0 | D3D11_CLEAR_STENCIL.0) as u32,
                1.0,
                0,
            );
        }
    }

    fn upload_object_constants(&mut self, constants: &ObjectConstants) {
        unsafe {
            self.device.context.UpdateSubresource(
                &self.buffers.constants,
                0,
                None,
                constants as *const ObjectConstants as *const _,
                0,
                0,
            );
        }
    }

    fn bind_object_resources(&mut self) {
        let context = &self.device.context;
        unsafe {
            context.VSSetConstantBuffers(0, Some(&[Some(self.buffers.constants.clone())]));
            context.PSSetShaderResources(0, Some(&[Some(self.material.texture_view.clone())]));
            context.PSSetSamplers(0, Some(&[Some(self.material.sampler.clone())]));
        }
    }

    fn draw_indexed(&mut self, index_count: u32) {
        unsafe { self.device.context.DrawIndexed(index_count, 0, 0) };
    }

    fn present(&mut self, sync_interval: u32) {
        let result = unsafe { self.device.swap_chain.Present(sync_interval, DXGI_PRESENT(0)) };
        if let Err(e) = result.ok() {
            log::warn!("failed to present the frame {e}");
        }
    }
}

/// Owns every device object and draws the two-cube scene.
pub struct Renderer {
    scene: Scene,
    camera: Camera,
    clear_color: [f32; 4],
    sync_interval: u32,
    gpu: Option<GpuResources>,
}

impl Renderer {
    pub fn new(config: &DemoConfig) -> Self {
        Self {
            scene: Scene::new(config.initial_rotation, config.rotation_step),
            camera: Camera::default(),
            clear_color: config.clear_color,
            sync_interval: 0,
            gpu: None,
        }
    }

    /// Creates every device resource in dependency order.
    ///
    /// The first failing step aborts; resources created before it are released.
    pub fn initialize(
        &mut self,
        hwnd: HWND,
        settings: &Settings,
        config: &DemoConfig,
        compiler: &impl ShaderCompiler,
    ) -> Result<()> {
        log::debug!("initializing renderer with {settings:?}");

        let device = create_device(hwnd, settings)?;
        let targets = create_render_targets(&device, settings)?;
        let pipeline = create_pipeline(&device, config, compiler)?;
        let buffers = create_object_buffers(&device)?;
        let material = create_material(&device, config)?;

        self.camera = Camera::new(settings);
        self.sync_interval = settings.sync_interval();

        let viewport = D3D11_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: settings.screen_width as f32,
            Height: settings.screen_height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        unsafe { device.context.RSSetViewports(Some(&[viewport])) };

        self.gpu = Some(GpuResources {
            material,
            buffers,
            pipeline,
            targets,
            device,
            fullscreen: settings.fullscreen,
        });

        log::info!("renderer initialized");
        Ok(())
    }

    pub fn update(&mut self) {
        self.scene.update();
    }

    /// Draws one frame. Returns `false` once the renderer has been terminated.
    pub fn render(&mut self) -> bool {
        let Some(gpu) = self.gpu.as_mut() else {
            return false;
        };

        render_frame(
            gpu,
            &self.scene,
            &self.camera,
            self.clear_color,
            self.sync_interval,
        );
        true
    }

    /// Releases every device object. Further calls are no-ops.
    pub fn terminate(&mut self) {
        if let Some(gpu) = self.gpu.take() {
            drop(gpu);
            gfx::report_live_objects();
            log::info!("renderer terminated");
        }
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn created<T>(object: Option<T>, step: &'static str) -> Result<T> {
    object.ok_or_else(missing_object).map_err(Error::graphics(step))
}

fn create_device(hwnd: HWND, settings: &Settings) -> Result<DeviceObjects> {
    let swap_chain_desc = DXGI_SWAP_CHAIN_DESC {
        BufferDesc: DXGI_MODE_DESC {
            Width: settings.screen_width,
            Height: settings.screen_height,
            RefreshRate: DXGI_RATIONAL {
                Numerator: 60,
                Denominator: 1,
            },
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            ScanlineOrdering: DXGI_MODE_SCANLINE_ORDER_UNSPECIFIED,
            Scaling: DXGI_MODE_SCALING_UNSPECIFIED,
        },
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
        BufferCount: 1,
        OutputWindow: hwnd,
        Windowed: (!settings.fullscreen).into(),
        SwapEffect: DXGI_SWAP_EFFECT_DISCARD,
        Flags: 0,
    };

    if cfg!(debug_assertions) {
        match create_device_and_swap_chain(&swap_chain_desc, D3D11_CREATE_DEVICE_DEBUG) {
            Ok(device) => return Ok(device),
            // The debug layer is missing unless the graphics tools are installed.
            Err(e) => log::warn!("debug device unavailable, falling back: {e}"),
        }
    }

    create_device_and_swap_chain(&swap_chain_desc, D3D11_CREATE_DEVICE_FLAG(0))
}

fn create_device_and_swap_chain(
    swap_chain_desc: &DXGI_SWAP_CHAIN_DESC,
    flags: D3D11_CREATE_DEVICE_FLAG,
) -> Result<DeviceObjects> {
    let mut swap_chain: Option<IDXGISwapChain> = None;
    let mut device: Option<ID3D11Device> = None;
    let mut context: Option<ID3D11DeviceContext> = None;
    let mut feature_level = D3D_FEATURE_LEVEL::default();

    unsafe {
        D3D11CreateDeviceAndSwapChain(
            None,
            D3D_DRIVER_TYPE_HARDWARE,
            HMODULE::default(),
            flags,
            None,
            D3D11_SDK_VERSION,
            Some(swap_chain_desc),
            Some(&mut swap_chain),
            Some(&mut device),
            Some(&mut feature_level),
            Some(&mut context),
        )
    }
    .map_err(Error::graphics("create device/swap chain"))?;

    log::info!("created D3D11 device with feature level {feature_level:?}");

    Ok(DeviceObjects {
        swap_chain: created(swap_chain, "create device/swap chain")?,
        context: created(context, "create device/swap chain")?,
        device: created(device, "create device/swap chain")?,
    })
}

fn create_render_targets(device: &DeviceObjects, settings: &Settings) -> Result<RenderTargets> {
    let back_buffer: ID3D11Texture2D = unsafe { device.swap_chain.GetBuffer(0) }
        .map_err(Error::graphics("get back buffer"))?;

    let mut render_target_view: Option<ID3D11RenderTargetView> = None;
    unsafe {
        device
            .device
            .CreateRenderTargetView(&back_buffer, None, Some(&mut render_target_view))
    }
    .map_err(Error::graphics("create rtv"))?;
    let render_target_view = created(render_target_view, "create rtv")?;

    let depth_desc = D3D11_TEXTURE2D_DESC {
        Width: settings.screen_width,
        Height: settings.screen_height,
        MipLevels: 1,
        ArraySize: 1,
        Format: DXGI_FORMAT_D24_UNORM_S8_UINT,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Usage: D3D11_USAGE_DEFAULT,
        BindFlags: D3D11_BIND_DEPTH_STENCIL.0 as u32,
        CPUAccessFlags: 0,
        MiscFlags: 0,
    };

    let mut depth_stencil_buffer: Option<ID3D11Texture2D> = None;
    unsafe {
        device
            .device
            .CreateTexture2D(&depth_desc, None, Some(&mut depth_stencil_buffer))
    }
    .map_err(Error::graphics("create depth/stencil buffer"))?;
    let depth_stencil_buffer = created(depth_stencil_buffer, "create depth/stencil buffer")?;

    let mut depth_stencil_view: Option<ID3D11DepthStencilView> = None;
    unsafe {
        device.device.CreateDepthStencilView(
            &depth_stencil_buffer,
            None,
            Some(&mut depth_stencil_view),
        )
    }
    .map_err(Error::graphics("create dsv"))?;
    let depth_stencil_view = created(depth_stencil_view, "create dsv")?;

    unsafe {
        device.context.OMSetRenderTargets(
            Some(&[Some(render_target_view.clone())]),
            &depth_stencil_view,
        );
    }

    log::debug!(
        "render targets bound ({}x{})",
        settings.screen_width,
        settings.screen_height
    );

    Ok(RenderTargets {
        depth_stencil_view,
        depth_stencil_buffer,
        render_target_view,
    })
}

fn create_pipeline(
    device: &DeviceObjects,
    config: &DemoConfig,
    compiler: &impl ShaderCompiler,
) -> Result<Pipeline> {
    let vs_bytecode = compiler.compile(&config.vertex_shader)?;
    let mut vertex_shader: Option<ID3D11VertexShader> = None;
    unsafe {
        device
            .device
            .CreateVertexShader(&vs_bytecode, None, Some(&mut vertex_shader))
    }
    .map_err(Error::graphics("create vertex shader"))?;
    let vertex_shader = created(vertex_shader, "create vertex shader")?;

    let ps_bytecode = compiler.compile(&config.pixel_shader)?;
    let mut pixel_shader: Option<ID3D11PixelShader> = None;
    unsafe {
        device
            .device
            .CreatePixelShader(&ps_bytecode, None, Some(&mut pixel_shader))
    }
    .map_err(Error::graphics("create pixel shader"))?;
    let pixel_shader = created(pixel_shader, "create pixel shader")?;

    let input_desc = [
        D3D11_INPUT_ELEMENT_DESC {
            SemanticName: PCSTR(c"POSITION".as_ptr() as _),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: std::mem::offset_of!(Vertex, position) as u32,
            InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
        D3D11_INPUT_ELEMENT_DESC {
            SemanticName: PCSTR(c"TEXCOORD".as_ptr() as _),
            SemanticIndex: 0,
            Format: DXGI_FORMAT_R32G32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: std::mem::offset_of!(Vertex, tex_coord) as u32,
            InputSlotClass: D3D11_INPUT_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
    ];

    let mut input_layout: Option<ID3D11InputLayout> = None;
    unsafe {
        device
            .device
            .CreateInputLayout(&input_desc, &vs_bytecode, Some(&mut input_layout))
    }
    .map_err(Error::graphics("create vertex layout"))?;
    let input_layout = created(input_layout, "create vertex layout")?;

    unsafe {
        let context = &device.context;
        context.IASetInputLayout(&input_layout);
        context.IASetPrimitiveTopology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
        context.VSSetShader(&vertex_shader, None);
        context.PSSetShader(&pixel_shader, None);
    }

    Ok(Pipeline {
        input_layout,
        pixel_shader,
        vertex_shader,
    })
}

fn create_object_buffers(device: &DeviceObjects) -> Result<ObjectBuffers> {
    let vertices = gfx::create_buffer(&device.device, D3D11_BIND_VERTEX_BUFFER, &CUBE_VERTICES)
        .map_err(Error::graphics("create vertex buffer"))?;

    let stride = std::mem::size_of::<Vertex>() as u32;
    let offset = 0u32;
    unsafe {
        device.context.IASetVertexBuffers(
            0,
            1,
            Some(&Some(vertices.clone())),
            Some(&stride),
            Some(&offset),
        );
    }

    let indices = gfx::create_buffer(&device.device, D3D11_BIND_INDEX_BUFFER, &CUBE_INDICES)
        .map_err(Error::graphics("create index buffer"))?;
    unsafe {
        device
            .context
            .IASetIndexBuffer(&indices, DXGI_FORMAT_R32_UINT, 0)
    };

    let constants = gfx::create_constant_buffer::<ObjectConstants>(&device.device)
        .map_err(Error::graphics("create constant buffer"))?;

    Ok(ObjectBuffers {
        constants,
        indices,
        vertices,
    })
}

fn create_material(device: &DeviceObjects, config: &DemoConfig) -> Result<Material> {
    let (texture, texture_view) = gfx::load_texture(&device.device, &config.texture_path)?;

    let desc = sampler_desc();

    let mut sampler: Option<ID3D11SamplerState> = None;
    unsafe {
        device
            .device
            .CreateSamplerState(&desc, Some(&mut sampler))
    }
    .map_err(Error::graphics("create sampler state"))?;
    let sampler = created(sampler, "create sampler state")?;

    Ok(Material {
        sampler,
        texture_view,
        texture,
    })
}

/// Linear-wrap sampler with 16x anisotropic filtering.
fn sampler_desc() -> D3D11_SAMPLER_DESC {
    D3D11_SAMPLER_DESC {
        Filter: D3D11_FILTER_ANISOTROPIC,
        AddressU: D3D11_TEXTURE_ADDRESS_WRAP,
        AddressV: D3D11_TEXTURE_ADDRESS_WRAP,
        AddressW: D3D11_TEXTURE_ADDRESS_WRAP,
        MipLODBias: 0.0,
        MaxAnisotropy: 16,
        ComparisonFunc: D3D11_COMPARISON_NEVER,
        BorderColor: [0.0; 4],
        MinLOD: 0.0,
        MaxLOD: D3D11_FLOAT32_MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_filters_anisotropically_and_wraps() {
        let desc = sampler_desc();

        assert_eq!(desc.Filter, D3D11_FILTER_ANISOTROPIC);
        assert_eq!(desc.MaxAnisotropy, 16);
        assert_eq!(desc.AddressU, D3D11_TEXTURE_ADDRESS_WRAP);
        assert_eq!(desc.AddressV, D3D11_TEXTURE_ADDRESS_WRAP);
        assert_eq!(desc.AddressW, D3D11_TEXTURE_ADDRESS_WRAP);
    }
}
