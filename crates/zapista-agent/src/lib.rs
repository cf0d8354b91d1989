pub mod circuit_breaker;
pub mod parser;
pub mod scope_filter;
pub mod tools;
pub mod turn;

pub use circuit_breaker::CircuitBreaker;
pub use turn::AgentLoop;
