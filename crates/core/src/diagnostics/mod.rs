pub mod convergence;

pub use convergence::ConvergenceMonitor;
