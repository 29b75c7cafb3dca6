use crate::comm::GravityRequest;
use crate::particles::Particle;
use crate::utils::HighPrecision;

/// Per-destination "needs remote data" flags raised during a local evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFlags {
    flags: Vec<bool>,
}

impl ExportFlags {
    pub fn new(tasks: usize) -> Self {
        Self { flags: vec![false; tasks] }
    }

    pub fn reset(&mut self) {
        self.flags.fill(false);
    }

    /// Marks `task`; out-of-range tasks are ignored.
    pub fn set(&mut self, task: usize) {
        if let Some(flag) = self.flags.get_mut(task) {
            *flag = true;
        }
    }

    pub fn is_set(&self, task: usize) -> bool {
        self.flags.get(task).copied().unwrap_or(false)
    }

    /// Flagged tasks in ascending order.
    pub fn iter_set(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags.iter().enumerate().filter(|(_, &f)| f).map(|(task, _)| task)
    }

    pub fn count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }
}

/// Tree-walk routine the pipeline drives; owned by the tree-building code.
///
/// Both evaluations must be deterministic for identical inputs and return
/// the potential without the gravitational constant.
pub trait PotentialTree<T: HighPrecision> {
    /// Potential at `particle` from data held by this task.
    ///
    /// Raises a flag in `exports` for every task whose data could not be
    /// approximated locally; the pipeline ships the particle there.
    fn evaluate_local(&self, particle: &Particle<T>, softening: T, exports: &mut ExportFlags) -> T;

    /// Potential at an imported request from data held by this task.
    fn evaluate_remote(&self, request: &GravityRequest<T>, softening: T) -> T;
}
