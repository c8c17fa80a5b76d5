#![forbid(unsafe_code)]

//! Optional GPU back-end for the fire filter.
//!
//! Feature-gated behind `gpu`. Device buffers are planned for one surface
//! geometry and cooling at a time; the plan is rebuilt lazily when either
//! changes, so steady-state frames only upload the source and read back the
//! result. Construction runs a small probe kernel and compares it against
//! the scalar back-end; any failure there disqualifies the device.
//!
//! Plans are checked against the device limits before any buffer exists. A
//! surface the device cannot hold is an ordinary [`GpuError`], which demotes
//! the back-end to the CPU instead of tripping wgpu's uncaptured-error
//! handler.

use std::fmt;
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use pollster::block_on;

use super::{Stencil, TOLERANCE, reciprocal_for, scalar};

const ENV_GPU_FORCE_FAIL: &str = "FIREFRAME_GPU_FORCE_FAIL";

const WORKGROUP_SIZE: u32 = 64;

fn env_truthy(key: &str) -> bool {
    std::env::var(key)
        .ok()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why the GPU could not be brought up. Never escapes back-end selection.
#[derive(Debug)]
pub enum GpuInitError {
    ForcedByEnv,
    AdapterNotFound,
    RequestDevice(wgpu::RequestDeviceError),
    Probe(GpuError),
    ProbeMismatch {
        index: usize,
        expected: i32,
        actual: i32,
    },
}

impl fmt::Display for GpuInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForcedByEnv => write!(f, "disabled by {ENV_GPU_FORCE_FAIL}"),
            Self::AdapterNotFound => write!(f, "no compatible adapter"),
            Self::RequestDevice(err) => write!(f, "device request failed: {err}"),
            Self::Probe(err) => write!(f, "probe kernel failed: {err}"),
            Self::ProbeMismatch {
                index,
                expected,
                actual,
            } => write!(
                f,
                "probe mismatch at {index}: expected {expected}, got {actual}"
            ),
        }
    }
}

impl std::error::Error for GpuInitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RequestDevice(err) => Some(err),
            Self::Probe(err) => Some(err),
            _ => None,
        }
    }
}

/// A failed frame on an initialized device.
#[derive(Debug)]
pub enum GpuError {
    Map(wgpu::BufferAsyncError),
    Poll(String),
    CallbackDropped,
    TooLarge(usize),
    ExceedsLimits {
        what: &'static str,
        requested: u64,
        limit: u64,
    },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Map(err) => write!(f, "readback map failed: {err}"),
            Self::Poll(msg) => write!(f, "device poll failed: {msg}"),
            Self::CallbackDropped => write!(f, "map callback dropped"),
            Self::TooLarge(len) => write!(f, "surface of {len} samples exceeds device indexing"),
            Self::ExceedsLimits {
                what,
                requested,
                limit,
            } => write!(f, "{what} needs {requested}, device limit is {limit}"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Map(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Split `total` workgroups over X and Y so neither exceeds `max_per_dim`.
fn split_groups(total: u32, max_per_dim: u32) -> (u32, u32) {
    let max_per_dim = max_per_dim.max(1);
    if total <= max_per_dim {
        (total, 1)
    } else {
        (max_per_dim, total.div_ceil(max_per_dim))
    }
}

/// Reject a plan the device cannot hold before any buffer is created.
fn check_limits(
    limits: &wgpu::Limits,
    src_bytes: u64,
    dst_bytes: u64,
    groups: (u32, u32),
) -> Result<(), GpuError> {
    let per_buffer = u64::from(limits.max_storage_buffer_binding_size).min(limits.max_buffer_size);
    for (what, requested) in [("source buffer", src_bytes), ("result buffer", dst_bytes)] {
        if requested > per_buffer {
            return Err(GpuError::ExceedsLimits {
                what,
                requested,
                limit: per_buffer,
            });
        }
    }
    let max_groups = limits.max_compute_workgroups_per_dimension;
    if groups.0 > max_groups || groups.1 > max_groups {
        return Err(GpuError::ExceedsLimits {
            what: "workgroup grid",
            requested: u64::from(groups.0.max(groups.1)),
            limit: u64::from(max_groups),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Device state
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct Params {
    end: u32,
    width: u32,
    reciprocal: i32,
    row_stride: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlanKey {
    src_len: usize,
    end: usize,
    width: usize,
    reciprocal: i32,
}

struct Plan {
    key: PlanKey,
    src_buffer: wgpu::Buffer,
    dst_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    groups: (u32, u32),
}

pub struct GpuConvolver {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    uniform_buffer: wgpu::Buffer,
    limits: wgpu::Limits,
    plan: Option<Plan>,
    adapter_name: String,
    simd_fallback: bool,
}

impl fmt::Debug for GpuConvolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuConvolver")
            .field("adapter", &self.adapter_name)
            .field("plan", &self.plan.as_ref().map(|p| p.key))
            .finish_non_exhaustive()
    }
}

impl GpuConvolver {
    /// Bring up a device and verify it with a probe kernel.
    ///
    /// `simd_fallback` records which CPU back-end to demote to if a later
    /// frame fails.
    pub fn probe(simd_fallback: bool) -> Result<Self, GpuInitError> {
        if env_truthy(ENV_GPU_FORCE_FAIL) {
            return Err(GpuInitError::ForcedByEnv);
        }
        let mut gpu = Self::new(simd_fallback)?;
        gpu.verify()?;
        // The probe plan is tiny; drop it so the first frame plans for real.
        gpu.plan = None;
        Ok(gpu)
    }

    fn new(simd_fallback: bool) -> Result<Self, GpuInitError> {
        let instance = wgpu::Instance::default();
        let adapter = block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
            .map_err(|_| GpuInitError::AdapterNotFound)?;
        let adapter_name = adapter.get_info().name;
        let (device, queue) = block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("fireframe-gpu-device"),
            ..Default::default()
        }))
        .map_err(GpuInitError::RequestDevice)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fireframe-convolve"),
            source: wgpu::ShaderSource::Wgsl(include_str!("convolve.wgsl").into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fireframe-convolve-pipeline"),
            layout: None,
            module: &shader,
            entry_point: Some("main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fireframe-convolve-params"),
            size: std::mem::size_of::<Params>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let limits = device.limits();
        Ok(Self {
            device,
            queue,
            pipeline,
            uniform_buffer,
            limits,
            plan: None,
            adapter_name,
            simd_fallback,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    pub fn simd_fallback(&self) -> bool {
        self.simd_fallback
    }

    /// Run a small known surface through the device and compare against the
    /// scalar back-end.
    fn verify(&mut self) -> Result<(), GpuInitError> {
        let width = 7;
        let src: Vec<i32> = (0..width * 6).map(|i| ((i * 4099) % 65_280) as i32).collect();
        let reciprocal = reciprocal_for(12);
        let Some(st) = Stencil::new(src.len(), src.len(), width, reciprocal) else {
            return Ok(());
        };
        let mut expected = vec![0; src.len()];
        let mut actual = vec![0; src.len()];
        scalar::convolve(&src, &mut expected, &st);
        self.convolve(&src, &mut actual, &st)
            .map_err(GpuInitError::Probe)?;
        for (index, (&e, &a)) in expected.iter().zip(&actual).enumerate() {
            if (e - a).abs() > TOLERANCE {
                return Err(GpuInitError::ProbeMismatch {
                    index,
                    expected: e,
                    actual: a,
                });
            }
        }
        Ok(())
    }

    fn ensure_plan(&mut self, src_len: usize, st: &Stencil) -> Result<(), GpuError> {
        let key = PlanKey {
            src_len,
            end: st.end,
            width: st.width,
            reciprocal: st.reciprocal,
        };
        if self.plan.as_ref().is_some_and(|p| p.key == key) {
            return Ok(());
        }
        let end = u32::try_from(st.end).map_err(|_| GpuError::TooLarge(st.end))?;
        let width = u32::try_from(st.width).map_err(|_| GpuError::TooLarge(st.width))?;
        if u32::try_from(src_len).is_err() {
            return Err(GpuError::TooLarge(src_len));
        }

        let groups = split_groups(
            end.div_ceil(WORKGROUP_SIZE),
            self.limits.max_compute_workgroups_per_dimension,
        );
        let word = std::mem::size_of::<i32>() as u64;
        check_limits(&self.limits, src_len as u64 * word, st.end as u64 * word, groups)?;

        let params = Params {
            end,
            width,
            reciprocal: st.reciprocal,
            row_stride: groups.0 * WORKGROUP_SIZE,
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&params));

        let src_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fireframe-convolve-src"),
            size: src_len as u64 * word,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let dst_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fireframe-convolve-dst"),
            size: st.end as u64 * word,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fireframe-convolve-readback"),
            size: st.end as u64 * word,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let layout = self.pipeline.get_bind_group_layout(0);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fireframe-convolve-bind-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: src_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: dst_buffer.as_entire_binding(),
                },
            ],
        });

        tracing::debug!(src_len, end = st.end, width = st.width, "gpu plan rebuilt");
        self.plan = Some(Plan {
            key,
            src_buffer,
            dst_buffer,
            readback_buffer,
            bind_group,
            groups,
        });
        Ok(())
    }

    pub fn convolve(&mut self, src: &[i32], dst: &mut [i32], st: &Stencil) -> Result<(), GpuError> {
        let src = &src[..(st.end + 2 * st.width).min(src.len())];
        self.ensure_plan(src.len(), st)?;
        let Some(plan) = self.plan.as_ref() else {
            return Ok(());
        };

        self.queue
            .write_buffer(&plan.src_buffer, 0, bytemuck::cast_slice(src));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fireframe-convolve-encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("fireframe-convolve-pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &plan.bind_group, &[]);
            pass.dispatch_workgroups(plan.groups.0, plan.groups.1, 1);
        }
        let bytes = (st.end * std::mem::size_of::<i32>()) as u64;
        encoder.copy_buffer_to_buffer(&plan.dst_buffer, 0, &plan.readback_buffer, 0, bytes);
        let submission = self.queue.submit(Some(encoder.finish()));

        let slice = plan.readback_buffer.slice(0..bytes);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_for_submission_index(submission))
            .map_err(|err| GpuError::Poll(err.to_string()))?;
        rx.recv()
            .map_err(|_| GpuError::CallbackDropped)?
            .map_err(GpuError::Map)?;

        {
            let data = slice.get_mapped_range();
            let out: &[i32] = bytemuck::cast_slice(&data);
            dst[..st.end].copy_from_slice(&out[..st.end]);
        }
        plan.readback_buffer.unmap();
        Ok(())
    }
}
