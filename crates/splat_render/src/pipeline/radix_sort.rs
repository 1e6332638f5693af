//! GPU key/value sort
//!
//! The tiling stage leaves an unsorted list of 32-bit (tile, depth) keys and
//! splat ids. [`RadixSort`] orders them with four stable 8-bit LSD passes.
//! Each pass is four dispatches (count, scan, scatter, copy) and the
//! scheduler puts a pass boundary between every one of them.
//!
//! The number of keys is only known on the GPU, so a one-thread prepare
//! kernel clamps it to capacity and writes indirect dispatch args that every
//! per-block kernel reads.

use splat_core::RADIX_PASSES;

use crate::buffers::{BufferId, BufferTable};
use crate::error::RenderError;
use crate::pipeline::kernel::{Access, Bindings, ComputeKernel, KernelDesc};
use crate::pipeline::shader_source;
use crate::pipeline::types::RADIX_PASS_STRIDE;
use crate::schedule::{ComputeStep, Dispatch, PassSchedule};

/// Anything that can sort the tiling output in place
///
/// After the scheduled steps run, `SortKeys` must be ascending over the first
/// `key_count` entries and `SortValues` permuted along with it.
pub trait SortStrategy {
    fn name(&self) -> &'static str;

    /// Rebuild bind groups against the current buffer table
    fn resolve(&mut self, device: &wgpu::Device, table: &BufferTable) -> Result<(), RenderError>;

    /// Append the sort's steps to a frame schedule
    fn schedule<'a>(&'a self, schedule: &mut PassSchedule<'a>, table: &'a BufferTable) -> Result<(), RenderError>;
}

const PREPARE_BINDINGS: Bindings = &[
    (BufferId::Globals, Access::Uniform),
    (BufferId::Counters, Access::Read),
    (BufferId::SortDispatch, Access::ReadWrite),
];

const COUNT_BINDINGS: Bindings = &[
    (BufferId::SortDispatch, Access::Read),
    (BufferId::SortKeys, Access::Read),
    (BufferId::GroupHistogram, Access::ReadWrite),
    (BufferId::DigitCounts, Access::ReadWrite),
];

const SCAN_BINDINGS: Bindings = &[
    (BufferId::SortDispatch, Access::Read),
    (BufferId::GroupHistogram, Access::ReadWrite),
    (BufferId::DigitCounts, Access::ReadWrite),
];

const SCATTER_BINDINGS: Bindings = &[
    (BufferId::SortDispatch, Access::Read),
    (BufferId::SortKeys, Access::Read),
    (BufferId::SortValues, Access::Read),
    (BufferId::GroupHistogram, Access::Read),
    (BufferId::SortKeysScratch, Access::ReadWrite),
    (BufferId::SortValuesScratch, Access::ReadWrite),
];

const COPY_BINDINGS: Bindings = &[
    (BufferId::SortDispatch, Access::Read),
    (BufferId::SortKeysScratch, Access::Read),
    (BufferId::SortValuesScratch, Access::Read),
    (BufferId::SortKeys, Access::ReadWrite),
    (BufferId::SortValues, Access::ReadWrite),
];

/// Stable LSD radix sort, 8 bits per pass
pub struct RadixSort {
    prepare: ComputeKernel,
    count: ComputeKernel,
    scan: ComputeKernel,
    scatter: ComputeKernel,
    copy: ComputeKernel,
}

impl RadixSort {
    pub fn new(device: &wgpu::Device) -> Self {
        let kernel = |label, source, bindings, pass_params| {
            ComputeKernel::new(
                device,
                KernelDesc {
                    label,
                    source,
                    bindings,
                    pass_params,
                },
            )
        };

        Self {
            prepare: kernel("Sort Prepare", shader_source!("sort_prepare.wgsl"), PREPARE_BINDINGS, false),
            count: kernel("Radix Count", shader_source!("radix_count.wgsl"), COUNT_BINDINGS, true),
            scan: kernel("Radix Scan", shader_source!("radix_scan.wgsl"), SCAN_BINDINGS, false),
            scatter: kernel("Radix Scatter", shader_source!("radix_scatter.wgsl"), SCATTER_BINDINGS, true),
            copy: kernel("Radix Copy", shader_source!("radix_copy.wgsl"), COPY_BINDINGS, false),
        }
    }

    fn kernels_mut(&mut self) -> [&mut ComputeKernel; 5] {
        [
            &mut self.prepare,
            &mut self.count,
            &mut self.scan,
            &mut self.scatter,
            &mut self.copy,
        ]
    }
}

impl SortStrategy for RadixSort {
    fn name(&self) -> &'static str {
        "radix8"
    }

    fn resolve(&mut self, device: &wgpu::Device, table: &BufferTable) -> Result<(), RenderError> {
        for kernel in self.kernels_mut() {
            kernel.resolve(device, table)?;
        }
        Ok(())
    }

    fn schedule<'a>(&'a self, schedule: &mut PassSchedule<'a>, table: &'a BufferTable) -> Result<(), RenderError> {
        let indirect = || -> Result<Dispatch<'a>, RenderError> {
            Ok(Dispatch::Indirect {
                id: BufferId::SortDispatch,
                buffer: table.get(BufferId::SortDispatch)?,
            })
        };

        schedule.push(ComputeStep {
            label: "sort prepare",
            kernel: &self.prepare,
            pass_offset: None,
            dispatch: Dispatch::Workgroups(1),
        });

        for pass in 0..RADIX_PASSES {
            let offset = Some((pass as u64 * RADIX_PASS_STRIDE) as u32);
            schedule.push(ComputeStep {
                label: "radix count",
                kernel: &self.count,
                pass_offset: offset,
                dispatch: indirect()?,
            });
            schedule.push(ComputeStep {
                label: "radix scan",
                kernel: &self.scan,
                pass_offset: None,
                dispatch: Dispatch::Workgroups(1),
            });
            schedule.push(ComputeStep {
                label: "radix scatter",
                kernel: &self.scatter,
                pass_offset: offset,
                dispatch: indirect()?,
            });
            schedule.push(ComputeStep {
                label: "radix copy",
                kernel: &self.copy,
                pass_offset: None,
                dispatch: indirect()?,
            });
        }

        Ok(())
    }
}

/// CPU model of the four radix kernels, dispatch for dispatch
#[cfg(test)]
mod emulation {
    use crate::pipeline::types::{RADIX_BINS, SORT_BLOCK, SORT_WORKGROUP};

    const BINS: usize = RADIX_BINS as usize;
    const BLOCK: usize = SORT_BLOCK as usize;
    const CHUNK: usize = SORT_WORKGROUP as usize;

    fn digit(key: u32, shift: u32) -> usize {
        ((key >> shift) & 0xff) as usize
    }

    fn count(keys: &[u32], shift: u32, groups: usize, histogram: &mut [u32], totals: &mut [u32; BINS]) {
        for g in 0..groups {
            let mut local = [0u32; BINS];
            for key in keys.iter().skip(g * BLOCK).take(BLOCK) {
                local[digit(*key, shift)] += 1;
            }
            for (bin, count) in local.iter().enumerate() {
                histogram[g * BINS + bin] = *count;
                totals[bin] += count;
            }
        }
    }

    fn scan(groups: usize, histogram: &mut [u32], totals: &mut [u32; BINS]) {
        let mut base = 0;
        for bin in 0..BINS {
            let mut running = base;
            base += std::mem::take(&mut totals[bin]);
            for g in 0..groups {
                let slot = g * BINS + bin;
                let count = histogram[slot];
                histogram[slot] = running;
                running += count;
            }
        }
    }

    fn scatter(keys: &[u32], values: &[u32], shift: u32, groups: usize, histogram: &[u32], out: (&mut [u32], &mut [u32])) {
        let (keys_out, values_out) = out;
        for g in 0..groups {
            let mut cursors: Vec<u32> = histogram[g * BINS..(g + 1) * BINS].to_vec();
            for c in 0..BLOCK / CHUNK {
                let start = g * BLOCK + c * CHUNK;
                let chunk: Vec<Option<usize>> = (start..start + CHUNK)
                    .map(|i| keys.get(i).map(|k| digit(*k, shift)))
                    .collect();
                for (t, d) in chunk.iter().enumerate() {
                    if let Some(d) = d {
                        let rank = chunk[..t].iter().filter(|x| **x == Some(*d)).count() as u32;
                        let dst = (cursors[*d] + rank) as usize;
                        keys_out[dst] = keys[start + t];
                        values_out[dst] = values[start + t];
                    }
                }
                for (bin, cursor) in cursors.iter_mut().enumerate() {
                    *cursor += chunk.iter().filter(|x| **x == Some(bin)).count() as u32;
                }
            }
        }
    }

    /// Run all passes on `keys`/`values` in place
    pub fn sort(keys: &mut [u32], values: &mut [u32], passes: u32) {
        let groups = keys.len().div_ceil(BLOCK).max(1);
        let mut histogram = vec![0u32; groups * BINS];
        let mut totals = [0u32; BINS];
        let mut scratch_keys = vec![0u32; keys.len()];
        let mut scratch_values = vec![0u32; values.len()];

        for pass in 0..passes {
            let shift = pass * 8;
            count(keys, shift, groups, &mut histogram, &mut totals);
            scan(groups, &mut histogram, &mut totals);
            scatter(keys, values, shift, groups, &histogram, (&mut scratch_keys, &mut scratch_values));
            keys.copy_from_slice(&scratch_keys);
            values.copy_from_slice(&scratch_values);
            assert!(totals.iter().all(|t| *t == 0), "scan must reset digit totals");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_emulated_sort_matches_std() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut keys: Vec<u32> = (0..10_000).map(|_| rng.random()).collect();
        let mut values: Vec<u32> = (0..10_000).collect();

        let mut expected: Vec<(u32, u32)> = keys.iter().copied().zip(values.iter().copied()).collect();
        expected.sort_by_key(|(k, _)| *k);

        emulation::sort(&mut keys, &mut values, RADIX_PASSES);
        let actual: Vec<(u32, u32)> = keys.into_iter().zip(values).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_emulated_sort_is_stable() {
        // Few distinct keys spread over several blocks and chunks
        let mut keys: Vec<u32> = (0..3000u32).map(|i| (i * 7919) % 5 << 20).collect();
        let mut values: Vec<u32> = (0..3000).collect();
        emulation::sort(&mut keys, &mut values, RADIX_PASSES);

        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        for w in keys.iter().zip(values.iter()).collect::<Vec<_>>().windows(2) {
            if w[0].0 == w[1].0 {
                assert!(w[0].1 < w[1].1, "equal keys reordered");
            }
        }
    }

    #[test]
    fn test_emulated_sort_partial_block() {
        let mut keys = vec![5, 1, 3];
        let mut values = vec![0, 1, 2];
        emulation::sort(&mut keys, &mut values, RADIX_PASSES);
        assert_eq!(keys, vec![1, 3, 5]);
        assert_eq!(values, vec![1, 2, 0]);
    }

    #[test]
    fn test_pass_offsets_are_dynamic_aligned() {
        for pass in 0..RADIX_PASSES as u64 {
            assert_eq!((pass * RADIX_PASS_STRIDE) % 256, 0);
        }
    }
}
