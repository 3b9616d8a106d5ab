/// What a neighbourhood operation sees when a tap falls outside the image.
#[derive(Debug, Clone, PartialEq)]
pub enum BorderMode<T> {
    /// The tap does not exist: it contributes nothing, not even a weight.
    Skip,
    /// The tap reads a fixed value.
    Constant(T),
}

impl<T: Copy> BorderMode<T> {
    /// Value read for a tap outside the image; `None` means the tap is skipped.
    pub fn outside(&self) -> Option<T> {
        match self {
            Self::Skip => None,
            Self::Constant(v) => Some(*v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BorderMode;

    #[test]
    fn only_constant_reads_outside() {
        assert_eq!(BorderMode::<u8>::Skip.outside(), None);
        assert_eq!(BorderMode::Constant(7u8).outside(), Some(7));
    }
}
