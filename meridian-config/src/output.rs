#[derive(knuffel::Decode, Debug, Clone, PartialEq)]
pub struct Output {
    #[knuffel(argument)]
    pub name: String,
    #[knuffel(child)]
    pub off: bool,
    /// Requested mode as `<width>x<height>[@<refresh rate>]`.
    ///
    /// Kept as written; it is matched against the monitor's modes when applied.
    #[knuffel(child, unwrap(argument))]
    pub mode: Option<String>,
}
