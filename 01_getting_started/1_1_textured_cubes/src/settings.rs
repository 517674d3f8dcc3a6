/// Presentation settings handed to the renderer once, at initialisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub screen_width: u32,
    pub screen_height: u32,
    pub fullscreen: bool,
    pub vsync: bool,
}

impl Settings {
    /// Settings for a client area of `size`; negative extents count as zero.
    pub fn from_client_size(size: (i32, i32), fullscreen: bool, vsync: bool) -> Self {
        Self {
            screen_width: size.0.max(0) as u32,
            screen_height: size.1.max(0) as u32,
            fullscreen,
            vsync,
        }
    }

    pub fn has_area(&self) -> bool {
        self.screen_width > 0 && self.screen_height > 0
    }

    /// Width over height, or 1.0 for a degenerate client area.
    pub fn aspect_ratio(&self) -> f32 {
        if !self.has_area() {
            return 1.0;
        }
        self.screen_width as f32 / self.screen_height as f32
    }

    /// Present interval: wait for one vertical blank with vsync, none without.
    pub fn sync_interval(&self) -> u32 {
        u32::from(self.vsync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn aspect_ratio_of_default_window() {
        let settings = Settings::from_client_size((1440, 1080), false, false);
        assert_relative_eq!(settings.aspect_ratio(), 4.0 / 3.0);
    }

    #[test]
    fn zero_area_window_does_not_divide_by_zero() {
        for size in [(0, 1080), (1440, 0), (0, 0), (-20, 300)] {
            let settings = Settings::from_client_size(size, false, false);
            assert!(!settings.has_area());
            assert_eq!(settings.aspect_ratio(), 1.0);
            assert!(settings.aspect_ratio().is_finite());
        }
    }

    #[test]
    fn sync_interval_follows_vsync() {
        assert_eq!(Settings::from_client_size((8, 8), false, false).sync_interval(), 0);
        assert_eq!(Settings::from_client_size((8, 8), false, true).sync_interval(), 1);
    }
}
