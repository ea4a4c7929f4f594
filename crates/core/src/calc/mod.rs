pub mod allocation;
pub mod overlap;
pub mod recommendation;
pub mod risk;
pub mod sip;
