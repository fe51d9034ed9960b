// ============================================================
// Layer 5 — Compute Device Selection
// ============================================================
// Maps the classic integer device id onto a Burn backend:
//
//   -1 (or any negative id) → CPU, Burn's NdArray backend
//    n >= 0                 → GPU n, Burn's Wgpu backend
//
// The backend is a TYPE in Burn, so the choice is made once at
// the top of a run and everything below is generic over it.
//
// Reference: Burn Book §2 (Backends)

use burn::backend::{
    ndarray::NdArrayDevice,
    wgpu::WgpuDevice,
    Autodiff, NdArray, Wgpu,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Autodiff backend used for CPU runs
pub type CpuBackend = Autodiff<NdArray>;

/// Autodiff backend used for GPU runs
pub type GpuBackend = Autodiff<Wgpu>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeDevice {
    Cpu,
    Gpu(usize),
}

impl ComputeDevice {
    pub fn from_id(id: i32) -> Self {
        if id < 0 {
            ComputeDevice::Cpu
        } else {
            ComputeDevice::Gpu(id as usize)
        }
    }

    pub fn cpu_device() -> NdArrayDevice {
        NdArrayDevice::Cpu
    }

    pub fn gpu_device(index: usize) -> WgpuDevice {
        WgpuDevice::DiscreteGpu(index)
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Cpu      => write!(f, "cpu"),
            ComputeDevice::Gpu(idx) => write!(f, "gpu:{idx}"),
        }
    }
}
