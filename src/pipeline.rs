//! Conversion planning and execution.
//!
//! The planner runs a cost-ordered search over [`ColorState`]s. Edges are
//! the one-step candidates every registered operator offers. The executor
//! then applies the chosen chain to a real image, one new image per step.

use alloc::vec::Vec;
use core::fmt;

use enough::Stop;
use tracing::{debug, trace, warn};

use crate::error::ConvertError;
use crate::image::PixelImage;
use crate::limits::Limits;
use crate::ops::{ColorConversionOp, OPERATORS};
use crate::options::ConversionOptions;
use crate::state::{ColorState, SpeedCost, Target};

/// Longest operator chain the planner will consider.
///
/// Some operators undo each other (e.g. the endianness swap), so the search
/// needs a bound even though costs only grow.
pub const MAX_PIPELINE_STEPS: usize = 6;

/// One planned operator application.
#[derive(Clone, Copy, Debug)]
pub struct Step {
    pub op: &'static dyn ColorConversionOp,
    /// The state the operator was planned to produce.
    pub output_state: ColorState,
}

/// An ordered chain of operators from one state to a target.
#[derive(Clone, Debug)]
pub struct ConversionPipeline {
    steps: Vec<Step>,
    options: ConversionOptions,
}

/// Search node: a reached state plus how it was reached.
struct Node {
    state: ColorState,
    cost: SpeedCost,
    depth: usize,
    /// Index into the processed list, `None` for the start node.
    prev: Option<usize>,
    op: Option<&'static dyn ColorConversionOp>,
}

impl ConversionPipeline {
    /// Plan a conversion with the built-in operators.
    pub fn construct(input: &ColorState, target: &Target, options: ConversionOptions) -> Result<Self, ConvertError> {
        Self::construct_with(OPERATORS, input, target, options)
    }

    /// Plan a conversion with a custom operator registry.
    ///
    /// Among equally cheap paths the one through the operator listed first
    /// in `operators` wins.
    pub fn construct_with(
        operators: &[&'static dyn ColorConversionOp],
        input: &ColorState,
        target: &Target,
        options: ConversionOptions,
    ) -> Result<Self, ConvertError> {
        if target.is_satisfied_by(input) {
            return Ok(Self {
                steps: Vec::new(),
                options,
            });
        }
        trace!(from = %input, to = %target, "constructing conversion pipeline");

        let mut processed: Vec<Node> = Vec::new();
        let mut border = alloc::vec![Node {
            state: *input,
            cost: SpeedCost(0),
            depth: 0,
            prev: None,
            op: None,
        }];

        while !border.is_empty() {
            // Strict `<`: the earliest cheapest border node wins ties.
            let mut min = 0;
            for (i, node) in border.iter().enumerate().skip(1) {
                if node.cost < border[min].cost {
                    min = i;
                }
            }
            processed.push(border.swap_remove(min));
            let current = processed.len() - 1;
            let (state, cost, depth) = {
                let node = &processed[current];
                (node.state, node.cost, node.depth)
            };
            trace!(%state, cost = cost.0, depth, "expanding node");

            if target.is_satisfied_by(&state) {
                let pipeline = Self {
                    steps: backtrack(&processed, current),
                    options,
                };
                debug!("{pipeline}");
                return Ok(pipeline);
            }
            if depth >= MAX_PIPELINE_STEPS {
                continue;
            }

            let steering = target.steering_state(&state);
            for &op in operators {
                for candidate in op.candidate_targets(&state, &steering, &options) {
                    let new_cost = cost + candidate.cost;
                    trace!(op = op.name(), state = %candidate.state, cost = new_cost.0, "candidate");

                    if processed.iter().any(|n| n.state == candidate.state) {
                        continue;
                    }
                    let next = Node {
                        state: candidate.state,
                        cost: new_cost,
                        depth: depth + 1,
                        prev: Some(current),
                        op: Some(op),
                    };
                    match border.iter_mut().find(|n| n.state == candidate.state) {
                        Some(existing) if existing.cost > new_cost => *existing = next,
                        Some(_) => {}
                        None => border.push(next),
                    }
                }
            }
        }

        debug!(from = %input, to = %target, "no conversion path");
        Err(ConvertError::UnsupportedConversion {
            from: *input,
            to: *target,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// The state the last step produces, or `None` for an empty pipeline.
    pub fn output_state(&self) -> Option<ColorState> {
        self.steps.last().map(|s| s.output_state)
    }

    /// Run every step on `input`. Cannot be cancelled.
    pub fn convert_image(&self, input: PixelImage) -> Result<PixelImage, ConvertError> {
        self.convert_image_with_stop(input, &enough::Unstoppable, None)
    }

    /// Run every step on `input`, checking `stop` before each step and, if
    /// given, `limits` against the image each step would allocate.
    ///
    /// A failing step means the image did not match what the plan assumed.
    /// The error is returned as [`ConvertError::StepFailed`]; no other path
    /// is tried.
    pub fn convert_image_with_stop(
        &self,
        input: PixelImage,
        stop: &dyn Stop,
        limits: Option<&Limits>,
    ) -> Result<PixelImage, ConvertError> {
        if let Some(limits) = limits {
            limits.check(input.width(), input.height())?;
        }
        let mut image = input;
        for step in &self.steps {
            stop.check()?;
            if let Some(limits) = limits {
                let bytes = step
                    .output_state
                    .image_bytes(image.width(), image.height())
                    .ok_or(ConvertError::DimensionsTooLarge {
                        width: image.width(),
                        height: image.height(),
                    })?;
                limits.check_memory(bytes)?;
            }

            let mut out = step
                .op
                .convert(&image, &step.output_state, &self.options)
                .map_err(|e| {
                    warn!(op = step.op.name(), error = %e, "conversion step failed after planning");
                    ConvertError::StepFailed {
                        op: step.op.name(),
                        source: alloc::boxed::Box::new(e),
                    }
                })?;
            debug!(op = step.op.name(), state = %step.output_state, "conversion step done");

            out.set_colorimetry(step.output_state.colorimetry.or(image.colorimetry()));
            out.set_premultiplied_alpha(image.is_premultiplied_alpha());
            image = out;
        }
        Ok(image)
    }
}

/// Operators along the path ending at `processed[last]`, in order.
fn backtrack(processed: &[Node], last: usize) -> Vec<Step> {
    let mut steps = Vec::with_capacity(processed[last].depth);
    let mut idx = Some(last);
    while let Some(node) = idx.map(|i| &processed[i]) {
        if let Some(op) = node.op {
            steps.push(Step {
                op,
                output_state: node.state,
            });
        }
        idx = node.prev;
    }
    steps.reverse();
    steps
}

impl fmt::Display for ConversionPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "final pipeline has {} steps:", self.steps.len())?;
        for step in &self.steps {
            writeln!(f, "> {}", step.op.name())?;
        }
        Ok(())
    }
}
