/// Monitors convergence of a fixed-point iteration.
///
/// The iteration is converged once the largest absolute change of any
/// value in the latest sweep is no greater than the tolerance.
#[derive(Debug)]
pub struct ConvergenceMonitor {
    tol: f64,
    max_iter: usize,
    history: Vec<ConvergenceRecord>,
}

#[derive(Debug, Clone)]
struct ConvergenceRecord {
    iteration: usize,
    max_change: f64,
}

impl ConvergenceMonitor {
    pub fn new(tol: f64, max_iter: usize) -> Self {
        Self {
            tol,
            max_iter,
            history: Vec::new(),
        }
    }

    /// Record a new sweep.
    pub fn record(&mut self, iteration: usize, max_change: f64) {
        self.history.push(ConvergenceRecord {
            iteration,
            max_change,
        });
    }

    /// Check if convergence criterion is met.
    pub fn is_converged(&self) -> bool {
        self.history
            .last()
            .map_or(false, |last| last.max_change <= self.tol)
    }

    /// Check if maximum iterations reached.
    pub fn max_reached(&self) -> bool {
        self.history.len() >= self.max_iter
    }

    /// Largest change recorded in the latest sweep.
    pub fn last_change(&self) -> Option<f64> {
        self.history.last().map(|r| r.max_change)
    }

    /// Iteration number of the latest sweep.
    pub fn last_iteration(&self) -> Option<usize> {
        self.history.last().map(|r| r.iteration)
    }

    /// Number of iterations recorded.
    pub fn n_iterations(&self) -> usize {
        self.history.len()
    }
}
