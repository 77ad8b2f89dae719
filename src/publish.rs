use anyhow::Result;

/// Publication boundary toward the robot control table. The consumer loop
/// polls the data channel and forwards each smoothed error here; the actual
/// network protocol lives behind this trait.
pub trait ErrorSink {
    fn publish(&mut self, error: f64) -> Result<()>;
}

/// Prints each value the way the dashboard would receive it. Stand-in sink
/// for bench testing without a robot on the network.
pub struct ConsoleSink;

impl ErrorSink for ConsoleSink {
    fn publish(&mut self, error: f64) -> Result<()> {
        println!("vision_pid {error:.2}");
        Ok(())
    }
}
