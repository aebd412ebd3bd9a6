use crate::Bounded;

#[derive(knuffel::Decode, Debug, Default, Clone, Copy, PartialEq)]
pub struct Scaling {
    /// Only offer and pick integer scale factors.
    #[knuffel(child)]
    pub integer_scales_only: bool,
    /// Forces this scale on every monitor instead of deriving one from the physical size.
    #[knuffel(child, unwrap(argument))]
    pub global_scaling_factor: Option<Bounded<1, 4>>,
}
