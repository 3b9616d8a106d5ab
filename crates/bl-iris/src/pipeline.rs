use bl_core::PixelBuffer;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::boundary::{IrisBoundary, IrisBoundaryConfig, find_iris_boundary};
use crate::daugman::{DaugmanParams, IrisEncoding, SectorLayout, encode};
use crate::error::IrisError;
use crate::pupil::{PupilConfig, PupilInfo, localize_pupil};

/// Eye image to iris code: pupil, iris boundary, polar unwrap, encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrisPipeline {
    pub pupil: PupilConfig,
    pub boundary: IrisBoundaryConfig,
    pub daugman: DaugmanParams,
    pub layout: SectorLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrisAnalysis {
    pub pupil: PupilInfo,
    pub boundary: IrisBoundary,
    pub encoding: IrisEncoding,
}

impl IrisPipeline {
    pub fn validate(&self) -> Result<(), IrisError> {
        self.pupil.validate()?;
        self.boundary.validate()?;
        self.daugman.validate()
    }

    /// Stops at the first failing stage.
    pub fn analyze(&self, buf: &PixelBuffer) -> Result<IrisAnalysis, IrisError> {
        self.validate()?;

        let pupil = localize_pupil(buf, &self.pupil)?;
        let boundary = find_iris_boundary(buf, &pupil, &self.boundary)?;
        let encoding = encode(buf, &boundary.geometry, &self.daugman, &self.layout)?;
        debug!(
            "iris code {}x{} with {} set bits",
            encoding.code.rows(),
            encoding.code.cols(),
            encoding.code.count_ones()
        );

        Ok(IrisAnalysis {
            pupil,
            boundary,
            encoding,
        })
    }
}
