use splat_core::TileGrid;

/// Fixed renderer configuration, chosen once at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererSettings {
    /// Screen tile grid
    pub grid: TileGrid,
    /// Composite walks at most this many (nearest) splats per tile
    pub max_splats_per_tile: u32,
    /// Sort pair budget per splat; sizes the key/value buffers
    pub pairs_per_splat: u32,
    /// Clear colour and composite background, RGBA
    pub background: [f32; 4],
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            grid: TileGrid::default(),
            max_splats_per_tile: 1 << 15,
            pairs_per_splat: 8,
            background: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl RendererSettings {
    pub fn background_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.background;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }
}
