//! Ordered compute pass scheduling
//!
//! A frame is a flat list of [`ComputeStep`]s executed in list order. Each
//! step knows which buffers it reads and writes (from its kernel's binding
//! list). When a step conflicts with anything already recorded in the open
//! compute pass, the pass is closed and a new one begun, so every dependent
//! step sits behind a pass boundary.

use std::collections::HashSet;
use std::ops::Range;

use crate::buffers::BufferId;
use crate::error::RenderError;
use crate::pipeline::kernel::ComputeKernel;

/// Workgroups needed for `items` threads, floored to one
///
/// Empty work still dispatches so buffer state stays consistent frame to frame.
pub fn dispatch_size(items: u32, workgroup: u32) -> u32 {
    items.div_ceil(workgroup).max(1)
}

/// How a step is dispatched
pub enum Dispatch<'a> {
    /// Fixed workgroup count along x
    Workgroups(u32),
    /// Workgroup counts read from a GPU buffer at offset 0
    Indirect { id: BufferId, buffer: &'a wgpu::Buffer },
}

/// One kernel dispatch in the frame
pub struct ComputeStep<'a> {
    pub label: &'static str,
    pub kernel: &'a ComputeKernel,
    /// Dynamic offset into the radix pass uniform, if the kernel takes one
    pub pass_offset: Option<u32>,
    pub dispatch: Dispatch<'a>,
}

impl ComputeStep<'_> {
    pub fn access(&self) -> StepAccess {
        let mut access = StepAccess::default();
        for (id, mode) in self.kernel.bindings() {
            access.reads.push(*id);
            if mode.writes() {
                access.writes.push(*id);
            }
        }
        if let Dispatch::Indirect { id, .. } = self.dispatch {
            access.reads.push(id);
        }
        access
    }
}

/// Buffers a step reads and writes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepAccess {
    pub reads: Vec<BufferId>,
    pub writes: Vec<BufferId>,
}

impl StepAccess {
    pub fn new(reads: &[BufferId], writes: &[BufferId]) -> Self {
        Self {
            reads: reads.to_vec(),
            writes: writes.to_vec(),
        }
    }
}

/// Indices of steps that must start a new compute pass
///
/// A step starts a new pass when it reads something written earlier in the
/// open pass (RAW), writes something read there (WAR), or writes something
/// written there (WAW). Index 0 is always included for a non-empty list.
pub fn barrier_points(steps: &[StepAccess]) -> Vec<usize> {
    let mut points = Vec::new();
    let mut read_set: HashSet<BufferId> = HashSet::new();
    let mut write_set: HashSet<BufferId> = HashSet::new();

    for (i, step) in steps.iter().enumerate() {
        let raw = step.reads.iter().any(|id| write_set.contains(id));
        let war = step.writes.iter().any(|id| read_set.contains(id));
        let waw = step.writes.iter().any(|id| write_set.contains(id));

        if i == 0 || raw || war || waw {
            points.push(i);
            read_set.clear();
            write_set.clear();
        }
        read_set.extend(step.reads.iter().copied());
        write_set.extend(step.writes.iter().copied());
    }

    points
}

/// Group steps into compute-pass ranges separated by barriers
pub fn segments(steps: &[StepAccess]) -> Vec<Range<usize>> {
    let points = barrier_points(steps);
    points
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = points.get(i + 1).copied().unwrap_or(steps.len());
            start..end
        })
        .collect()
}

/// Ordered list of compute steps for one submission
#[derive(Default)]
pub struct PassSchedule<'a> {
    steps: Vec<ComputeStep<'a>>,
}

impl<'a> PassSchedule<'a> {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn push(&mut self, step: ComputeStep<'a>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.label).collect()
    }

    pub fn accesses(&self) -> Vec<StepAccess> {
        self.steps.iter().map(ComputeStep::access).collect()
    }

    /// Record all steps, one compute pass per hazard-free segment
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) -> Result<(), RenderError> {
        for range in segments(&self.accesses()) {
            let label = self.steps[range.start].label;
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            for step in &self.steps[range] {
                step.kernel.record(&mut pass, step.pass_offset, &step.dispatch)?;
            }
        }
        Ok(())
    }
}
