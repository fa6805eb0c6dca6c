mod session_rng;

pub mod match_three;

pub use session_rng::SessionRng;
