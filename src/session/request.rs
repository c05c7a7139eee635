//! Print requests.

use image::RgbaImage;
use uuid::Uuid;

use crate::error::EtiquetaError;
use crate::printer::DeviceModel;

/// Largest number of copies one request may ask for.
pub const MAX_QUANTITY: u8 = 100;

/// One print action: a feed-oriented image plus job settings.
///
/// Validated once at construction against the target model; the session
/// trusts it afterwards and consumes it exactly once.
#[derive(Debug, Clone)]
pub struct PrintRequest {
    id: Uuid,
    image: RgbaImage,
    density: u8,
    quantity: u8,
}

impl PrintRequest {
    /// ## Errors
    ///
    /// Returns [`EtiquetaError::Precondition`] if `density` is outside
    /// `1..=model.max_density`, `quantity` is outside `1..=100`, or the image
    /// is empty.
    pub fn new(
        image: RgbaImage,
        density: u8,
        quantity: u8,
        model: &DeviceModel,
    ) -> Result<Self, EtiquetaError> {
        if !model.accepts_density(density) {
            return Err(EtiquetaError::Precondition(format!(
                "Density {} outside 1..={} for {}",
                density, model.max_density, model.name
            )));
        }
        if !(1..=MAX_QUANTITY).contains(&quantity) {
            return Err(EtiquetaError::Precondition(format!(
                "Quantity {} outside 1..={}",
                quantity, MAX_QUANTITY
            )));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(EtiquetaError::Precondition("Image is empty".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            image,
            density,
            quantity,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn density(&self) -> u8 {
        self.density
    }

    pub fn quantity(&self) -> u8 {
        self.quantity
    }
}
