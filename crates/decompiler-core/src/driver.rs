//! Multi-pass decompiler driver.

use std::collections::{BTreeSet, VecDeque};

use log::{debug, warn};

use crate::config::DecompilerConfig;
use crate::context::{DecodeContext, Discoveries, TargetKind};
use crate::fault::{DecodeError, DecodeFault};

/// How a pass ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum PassOutcome {
    /// Every reachable instruction was decoded.
    Finished {
        /// Instructions decoded in this pass.
        steps: usize,
    },
    /// The step limit was reached first. Not an error.
    StepLimit {
        /// Instructions decoded in this pass.
        steps: usize,
    },
}

impl PassOutcome {
    /// Instructions decoded in the pass.
    #[must_use]
    pub const fn steps(self) -> usize {
        match self {
            Self::Finished { steps } | Self::StepLimit { steps } => steps,
        }
    }

    /// Returns `true` when the pass decoded everything reachable.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// Decodes one image from a start offset, pass by pass.
#[derive(Debug, Clone)]
pub struct Decompiler<'a> {
    config: DecompilerConfig,
    start_offset: usize,
    context: DecodeContext<'a>,
}

impl<'a> Decompiler<'a> {
    /// Creates a decompiler over `image[start_offset..]`, whose first byte
    /// maps to `load_point`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeFault::StartOffsetOutOfRange`] when `start_offset`
    /// lies past the end of `image`.
    pub fn new(
        image: &'a [u8],
        load_point: u16,
        start_offset: usize,
        config: DecompilerConfig,
    ) -> Result<Self, DecodeFault> {
        let buffer = image
            .get(start_offset..)
            .ok_or(DecodeFault::StartOffsetOutOfRange {
                start_offset,
                len: image.len(),
            })?;
        Ok(Self {
            config,
            start_offset,
            context: DecodeContext::new(buffer, load_point),
        })
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &DecompilerConfig {
        &self.config
    }

    /// Underlying decode context.
    #[must_use]
    pub const fn context(&self) -> &DecodeContext<'a> {
        &self.context
    }

    /// Returns `true` when the last pass decoded everything reachable.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.context.is_finished()
    }

    /// Listing lines decoded so far, ordered by address.
    #[must_use]
    pub fn listing(&self) -> Vec<String> {
        self.context.dump()
    }

    /// Everything discovered so far.
    #[must_use]
    pub fn discoveries(&self) -> Discoveries {
        self.context.discoveries()
    }

    /// Runs one pass.
    ///
    /// `entry_points` and `memory_locations` seed the pass. Afterwards they
    /// receive every referenced memory location and the control-flow targets
    /// that lie outside the image; targets inside it are queued here.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when an instruction cannot be decoded. The
    /// listing decoded before the failure stays available.
    pub fn decode(
        &mut self,
        entry_points: &mut BTreeSet<u16>,
        memory_locations: &mut BTreeSet<u16>,
    ) -> Result<PassOutcome, DecodeError> {
        let ctx = &mut self.context;
        for address in entry_points.iter() {
            ctx.add_target(*address, TargetKind::Function);
        }
        for address in memory_locations.iter() {
            ctx.add_memory_location(*address);
        }
        ctx.begin_pass();

        let trace_length = self.config.trace_length;
        let mut trace = VecDeque::with_capacity(trace_length);
        let mut bytes_parsed = 0;
        let mut steps = 0;
        while steps < self.config.step_limit && !ctx.is_finished() {
            let offset = ctx.cursor().offset();
            let address = ctx.address_of(offset);
            if trace_length > 0 {
                if trace.len() == trace_length {
                    trace.pop_front();
                }
                trace.push_back(address);
            }

            if let Err(fault) = ctx.decode() {
                warn!(
                    "decode failed at {address:04x} ({:?}): {fault}",
                    ctx.run_state()
                );
                warn!("last {} PC value(s):", trace.len());
                for pc in &trace {
                    warn!("  {pc:04x}");
                }
                return Err(DecodeError {
                    offset: self.start_offset + offset,
                    address,
                    entry_point: ctx.entry_point(),
                    dump: ctx.cursor().inspect_here().to_vec(),
                    decoded: steps,
                    bytes_parsed,
                    trace: trace.into_iter().collect(),
                    fault,
                });
            }
            bytes_parsed += ctx.last_byte_length();
            steps += 1;
        }

        let discoveries = ctx.out_of_range_discoveries();
        if !discoveries.is_empty() {
            debug!(
                "handing back {} function(s), {} jump(s), {} memory location(s) outside the image",
                discoveries.functions.len(),
                discoveries.jumps.len(),
                discoveries.memory_locations.len()
            );
        }
        entry_points.extend(discoveries.functions);
        entry_points.extend(discoveries.jumps);
        memory_locations.extend(discoveries.memory_locations);

        if ctx.is_finished() {
            debug!("pass finished after {steps} instruction(s), {bytes_parsed} byte(s)");
            Ok(PassOutcome::Finished { steps })
        } else {
            debug!("pass stopped at the step limit of {}", self.config.step_limit);
            Ok(PassOutcome::StepLimit { steps })
        }
    }

    /// Runs passes until one discovers nothing new, a pass stops at the step
    /// limit, or `max_passes` is reached.
    ///
    /// # Errors
    ///
    /// Returns the first pass failure.
    pub fn decode_to_fixpoint(
        &mut self,
        entry_points: &mut BTreeSet<u16>,
        memory_locations: &mut BTreeSet<u16>,
    ) -> Result<PassOutcome, DecodeError> {
        let mut total = 0;
        for pass in 0..self.config.max_passes.max(1) {
            let known = (entry_points.len(), memory_locations.len());
            let outcome = self.decode(entry_points, memory_locations)?;
            total += outcome.steps();
            let saturated = known == (entry_points.len(), memory_locations.len());
            if !outcome.is_finished() {
                return Ok(PassOutcome::StepLimit { steps: total });
            }
            if saturated {
                debug!("fixpoint reached after {} pass(es)", pass + 1);
                break;
            }
        }
        Ok(PassOutcome::Finished { steps: total })
    }
}
