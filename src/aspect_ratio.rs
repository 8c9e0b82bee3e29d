use crate::types::Size;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisAlign {
    Min,
    Mid,
    Max,
}

impl AxisAlign {
    fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("min") {
            Some(AxisAlign::Min)
        } else if raw.eq_ignore_ascii_case("mid") {
            Some(AxisAlign::Mid)
        } else if raw.eq_ignore_ascii_case("max") {
            Some(AxisAlign::Max)
        } else {
            None
        }
    }

    fn offset(self, container: f64, scaled: f64) -> f64 {
        match self {
            AxisAlign::Min => 0.0,
            AxisAlign::Mid => (container - scaled) / 2.0,
            AxisAlign::Max => container - scaled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    None,
    Align { x: AxisAlign, y: AxisAlign },
}

impl Alignment {
    /// `xMinYMax` style keyword; anything unparseable falls back to mid/mid.
    fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        if raw == "none" {
            return Alignment::None;
        }
        parse_align_keyword(raw.trim()).unwrap_or_default()
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Align {
            x: AxisAlign::Mid,
            y: AxisAlign::Mid,
        }
    }
}

fn parse_align_keyword(raw: &str) -> Option<Alignment> {
    if raw.len() != 8 || !raw.is_ascii() {
        return None;
    }
    let (x_part, y_part) = raw.split_at(4);
    if !x_part[..1].eq_ignore_ascii_case("x") || !y_part[..1].eq_ignore_ascii_case("y") {
        return None;
    }
    Some(Alignment::Align {
        x: AxisAlign::parse(&x_part[1..])?,
        y: AxisAlign::parse(&y_part[1..])?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeetOrSlice {
    #[default]
    Meet,
    Slice,
}

/// A parsed `preserveAspectRatio` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AspectRatioSpec {
    pub defer: bool,
    pub align: Alignment,
    pub mode: MeetOrSlice,
}

impl AspectRatioSpec {
    pub const DEFAULT: &'static str = "xMidYMid meet";

    pub fn parse(input: &str) -> Self {
        let mut words = input.split_whitespace().peekable();
        let defer = words.next_if_eq(&"defer").is_some();
        let align = Alignment::parse(words.next());
        let mode = match words.next() {
            Some("slice") => MeetOrSlice::Slice,
            _ => MeetOrSlice::Meet,
        };
        Self { defer, align, mode }
    }

    pub fn is_slice(&self) -> bool {
        self.mode == MeetOrSlice::Slice
    }

    /// Fits `object` into `container`, returning the scaled box and its
    /// offset inside the container.
    pub fn resolve(&self, container: Size, object: Size) -> AspectRatio {
        let (x_align, y_align) = match self.align {
            Alignment::None => {
                return AspectRatio {
                    width: container.width,
                    height: container.height,
                    x: 0.0,
                    y: 0.0,
                };
            }
            Alignment::Align { x, y } => (x, y),
        };

        let container_ratio = container.width / container.height;
        let object_ratio = object.width / object.height;

        if (container_ratio > object_ratio) == self.is_slice() {
            let height = container.width / object_ratio;
            AspectRatio {
                width: container.width,
                height,
                x: 0.0,
                y: y_align.offset(container.height, height),
            }
        } else {
            let width = container.height * object_ratio;
            AspectRatio {
                width,
                height: container.height,
                x: x_align.offset(container.width, width),
                y: 0.0,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AspectRatio {
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(spec: &str, container: (f64, f64), object: (f64, f64)) -> [f64; 4] {
        let r = AspectRatioSpec::parse(spec).resolve(
            Size::new(container.0, container.1),
            Size::new(object.0, object.1),
        );
        [r.width, r.height, r.x, r.y]
    }

    #[test]
    fn none_stretches_to_the_container() {
        assert_eq!(fit("none", (50.0, 80.0), (100.0, 100.0)), [50.0, 80.0, 0.0, 0.0]);
        assert_eq!(fit("none", (100.0, 100.0), (50.0, 80.0)), [100.0, 100.0, 0.0, 0.0]);
    }

    #[test]
    fn meet_with_smaller_container() {
        let c = ((50.0, 80.0), (100.0, 100.0));
        assert_eq!(fit("xMidYMid meet", c.0, c.1), [50.0, 50.0, 0.0, 15.0]);
        assert_eq!(fit("xMinYMin meet", c.0, c.1), [50.0, 50.0, 0.0, 0.0]);
        assert_eq!(fit("xMaxYMax meet", c.0, c.1), [50.0, 50.0, 0.0, 30.0]);
    }

    #[test]
    fn meet_with_bigger_containers() {
        let c = ((100.0, 80.0), (50.0, 50.0));
        assert_eq!(fit("xMidYMid meet", c.0, c.1), [80.0, 80.0, 10.0, 0.0]);
        assert_eq!(fit("xMaxYMax meet", c.0, c.1), [80.0, 80.0, 20.0, 0.0]);

        let square = ((100.0, 100.0), (50.0, 80.0));
        assert_eq!(fit("xMidYMid meet", square.0, square.1), [62.5, 100.0, 18.75, 0.0]);
        assert_eq!(fit("xMaxYMax meet", square.0, square.1), [62.5, 100.0, 37.5, 0.0]);

        let odd = ((100.0, 20.0), (50.0, 50.0));
        assert_eq!(fit("xMidYMid meet", odd.0, odd.1), [20.0, 20.0, 40.0, 0.0]);
        assert_eq!(fit("xMaxYMax meet", odd.0, odd.1), [20.0, 20.0, 80.0, 0.0]);
    }

    #[test]
    fn slice_covers_the_container() {
        let small = ((50.0, 80.0), (100.0, 100.0));
        assert_eq!(fit("xMidYMid slice", small.0, small.1), [80.0, 80.0, -15.0, 0.0]);
        assert_eq!(fit("xMinYMin slice", small.0, small.1), [80.0, 80.0, 0.0, 0.0]);
        assert_eq!(fit("xMaxYMax slice", small.0, small.1), [80.0, 80.0, -30.0, 0.0]);

        let odd = ((100.0, 20.0), (50.0, 50.0));
        assert_eq!(fit("xMidYMid slice", odd.0, odd.1), [100.0, 100.0, 0.0, -40.0]);
        assert_eq!(fit("xMaxYMax slice", odd.0, odd.1), [100.0, 100.0, 0.0, -80.0]);
    }

    #[test]
    fn empty_or_invalid_values_behave_like_the_default() {
        let expected = fit(AspectRatioSpec::DEFAULT, (50.0, 80.0), (100.0, 100.0));
        assert_eq!(fit("", (50.0, 80.0), (100.0, 100.0)), expected);
        assert_eq!(fit("completely invalid", (50.0, 80.0), (100.0, 100.0)), expected);
    }

    #[test]
    fn defer_is_parsed_but_does_not_change_the_fit() {
        let spec = AspectRatioSpec::parse("defer xMinYMax slice");
        assert!(spec.defer);
        assert!(spec.is_slice());
        assert_eq!(
            spec.align,
            Alignment::Align {
                x: AxisAlign::Min,
                y: AxisAlign::Max
            }
        );
        assert_eq!(
            fit("defer xMidYMid meet", (50.0, 80.0), (100.0, 100.0)),
            fit("xMidYMid meet", (50.0, 80.0), (100.0, 100.0))
        );
    }
}
