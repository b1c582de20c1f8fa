//! Boundary between the interpretation core and whatever draws it.

use crate::config::Config;
use crate::globe::{ContinentRegion, GlobeFrame, GlobeMapper, GlobeTransform};
use crate::interaction::InteractionState;
use crate::panel::{PanelMapper, PanelPosition, Viewport};

/// Receives the per-frame visual parameters. Every call is idempotent.
pub trait Presenter {
    fn set_globe_transform(&mut self, transform: GlobeTransform);
    fn set_active_continent(&mut self, region: &'static ContinentRegion);
    fn set_panel_position(&mut self, position: PanelPosition);
}

/// Both mappers, advanced together once per animation frame.
pub struct Scene {
    globe: GlobeMapper,
    panel: PanelMapper,
    last_globe: Option<GlobeFrame>,
}

impl Scene {
    pub fn new(config: &Config, viewport: Viewport) -> Self {
        Self {
            globe: GlobeMapper::new(config.globe),
            panel: PanelMapper::new(config.panel, viewport).with_mirrored(config.camera.mirrored),
            last_globe: None,
        }
    }

    pub fn last_globe_frame(&self) -> Option<&GlobeFrame> {
        self.last_globe.as_ref()
    }

    pub fn panel_position(&self) -> PanelPosition {
        self.panel.position()
    }

    /// Advance one frame from `snapshot` and push the results out.
    /// The continent setter is skipped when no region faces the camera.
    pub fn tick<P: Presenter + ?Sized>(
        &mut self,
        snapshot: &InteractionState,
        dt: f64,
        viewport: Viewport,
        presenter: &mut P,
    ) {
        let globe = self.globe.update(&snapshot.globe_hand, dt);
        let panel = self.panel.update(&snapshot.panel_hand, viewport);

        presenter.set_globe_transform(globe.transform);
        if let Some(region) = globe.continent {
            presenter.set_active_continent(region);
        }
        presenter.set_panel_position(panel);

        self.last_globe = Some(globe);
    }
}
