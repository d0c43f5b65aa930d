//! Theme colors, resolved from an explicit render context.

use crate::config::Color;

/// Identifies whose colors are being resolved for a render.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderContext {
    pub theme_key: String,
    pub object_id: Option<String>,
}

impl RenderContext {
    pub fn new(theme_key: impl Into<String>) -> Self {
        Self {
            theme_key: theme_key.into(),
            object_id: None,
        }
    }

    pub fn with_object(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }
}

/// Colors of the non-data parts of a gauge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub panel: Color,
    pub tick: Color,
    pub label: Color,
    pub needle: Color,
    pub hub: Color,
    pub value_fill: Color,
    pub highlight: Color,
    pub target: Color,
}

impl Palette {
    pub const LIGHT: Palette = Palette {
        panel: Color::new(0xf4, 0xf4, 0xf4),
        tick: Color::new(0x20, 0x20, 0x20),
        label: Color::new(0x20, 0x20, 0x20),
        needle: Color::new(0xd0, 0x10, 0x10),
        hub: Color::new(0x30, 0x30, 0x30),
        value_fill: Color::new(0x3a, 0x7b, 0xd5),
        highlight: Color::new(0xff, 0x00, 0x00).with_alpha(0x60),
        target: Color::new(0x10, 0x10, 0x10),
    };

    pub const DARK: Palette = Palette {
        panel: Color::new(0x1c, 0x1e, 0x22),
        tick: Color::new(0xe0, 0xe0, 0xe0),
        label: Color::new(0xf0, 0xf0, 0xf0),
        needle: Color::new(0xff, 0x50, 0x30),
        hub: Color::new(0xc0, 0xc0, 0xc0),
        value_fill: Color::new(0x4f, 0xa3, 0xff),
        highlight: Color::new(0xff, 0x40, 0x40).with_alpha(0x60),
        target: Color::new(0xff, 0xff, 0xff),
    };
}

/// Maps a render context to a palette.
pub trait ThemeResolver {
    fn palette(&self, ctx: &RenderContext) -> Palette;
}

/// Built-in "light" and "dark" themes; any other key falls back to light.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTheme;

impl ThemeResolver for DefaultTheme {
    fn palette(&self, ctx: &RenderContext) -> Palette {
        match ctx.theme_key.as_str() {
            "dark" => Palette::DARK,
            _ => Palette::LIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_theme_falls_back_to_light() {
        let theme = DefaultTheme;
        assert_eq!(theme.palette(&RenderContext::new("neon")), Palette::LIGHT);
        assert_eq!(
            theme.palette(&RenderContext::new("dark").with_object("gauge-1")),
            Palette::DARK
        );
    }
}
