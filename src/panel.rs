// src/panel.rs
//! Slider panel bound to material properties.
//!
//! Bindings are one-way: a slider owns its displayed value and writes it into
//! the material when moved. Writes made to the material from elsewhere are not
//! pulled back into the slider.

use crate::error::Result;
use crate::material::{MaterialProperty, SurfaceMaterial};

/// One slider bound to one numeric material property.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderBinding {
    property: MaterialProperty,
    min: f32,
    max: f32,
    step: f32,
    value: f32,
}

impl SliderBinding {
    pub fn property(&self) -> MaterialProperty {
        self.property
    }

    pub fn label(&self) -> &'static str {
        self.property.name()
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn step(&self) -> f32 {
        self.step
    }

    /// Value currently shown by the slider.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Snap to the step grid anchored at `min`, then clamp to `[min, max]`.
    /// The bounds themselves are always reachable exactly.
    pub fn quantize(&self, raw: f32) -> f32 {
        if raw.is_nan() || raw <= self.min {
            return self.min;
        }
        if raw >= self.max {
            return self.max;
        }
        let steps = ((raw - self.min) / self.step).round();
        (self.min + steps * self.step).clamp(self.min, self.max)
    }

    /// Move the slider and write the result into `material`.
    pub fn set_value(&mut self, raw: f32, material: &mut SurfaceMaterial) -> f32 {
        self.value = self.quantize(raw);
        *material.property_mut(self.property) = self.value;
        log::debug!("Panel: {} = {}", self.property, self.value);
        self.value
    }

    /// Draw the slider. Returns true when the user moved it this frame.
    pub fn ui(&mut self, ui: &mut egui::Ui, material: &mut SurfaceMaterial) -> bool {
        let mut shown = self.value;
        let response = ui.add(
            egui::Slider::new(&mut shown, self.min..=self.max)
                .step_by(self.step as f64)
                .text(self.label()),
        );
        if response.changed() {
            self.set_value(shown, material);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParameterPanel {
    bindings: Vec<SliderBinding>,
}

impl ParameterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slider for `property`. Its starting value is read from `material`
    /// once, here.
    pub fn bind(
        &mut self,
        material: &SurfaceMaterial,
        property: MaterialProperty,
        min: f32,
        max: f32,
        step: f32,
    ) -> Result<&SliderBinding> {
        crate::ensure!(min.is_finite() && max.is_finite() && min < max, "invalid slider range {}..{}", min, max);
        crate::ensure!(step.is_finite() && step > 0.0, "invalid slider step {}", step);

        let mut binding = SliderBinding {
            property,
            min,
            max,
            step,
            value: min,
        };
        binding.value = binding.quantize(material.get(property));
        self.bindings.push(binding);
        Ok(&self.bindings[self.bindings.len() - 1])
    }

    /// The four terrain sliders.
    pub fn standard(material: &SurfaceMaterial) -> Result<Self> {
        let mut panel = Self::new();
        panel.bind(material, MaterialProperty::DisplacementBias, -10.0, 10.0, 0.001)?;
        panel.bind(material, MaterialProperty::DisplacementScale, 0.0, 2.0, 0.001)?;
        panel.bind(material, MaterialProperty::Metalness, 0.0, 1.0, 0.001)?;
        panel.bind(material, MaterialProperty::Roughness, 0.0, 1.0, 0.001)?;
        Ok(panel)
    }

    pub fn bindings(&self) -> &[SliderBinding] {
        &self.bindings
    }

    pub fn binding_mut(&mut self, property: MaterialProperty) -> Option<&mut SliderBinding> {
        self.bindings.iter_mut().find(|b| b.property == property)
    }

    /// Draw every slider inside a floating window.
    pub fn show(&mut self, ctx: &egui::Context, material: &mut SurfaceMaterial) -> bool {
        let mut changed = false;
        egui::Window::new("Controls")
            .anchor(egui::Align2::RIGHT_TOP, [-8.0, 8.0])
            .resizable(false)
            .collapsible(true)
            .show(ctx, |ui| {
                for binding in &mut self.bindings {
                    changed |= binding.ui(ui, material);
                }
            });
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::tests::test_material;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_standard_panel_bindings() {
        let m = test_material();
        let panel = ParameterPanel::standard(&m).unwrap();
        let ranges: Vec<_> = panel.bindings().iter().map(|b| (b.label(), b.range(), b.step())).collect();
        assert_eq!(
            ranges,
            vec![
                ("displacementBias", (-10.0, 10.0), 0.001),
                ("displacementScale", (0.0, 2.0), 0.001),
                ("metalness", (0.0, 1.0), 0.001),
                ("roughness", (0.0, 1.0), 0.001),
            ]
        );
        assert_eq!(panel.bindings()[0].value(), -2.0);
        assert_eq!(panel.bindings()[3].value(), 1.0);
    }

    #[test]
    fn test_bounds_are_exact() {
        let mut m = test_material();
        let mut panel = ParameterPanel::standard(&m).unwrap();
        for property in MaterialProperty::ALL {
            let b = panel.binding_mut(property).unwrap();
            let (min, max) = b.range();
            assert_eq!(b.set_value(min, &mut m), min);
            assert_eq!(m.get(property), min);
            assert_eq!(b.set_value(max, &mut m), max);
            assert_eq!(m.get(property), max);
            // out of range clamps
            assert_eq!(b.set_value(max + 5.0, &mut m), max);
            assert_eq!(b.set_value(min - 5.0, &mut m), min);
        }
    }

    #[test]
    fn test_intermediate_values_snap_to_step() {
        let mut m = test_material();
        let mut panel = ParameterPanel::standard(&m).unwrap();
        let b = panel.binding_mut(MaterialProperty::Metalness).unwrap();
        assert_abs_diff_eq!(b.set_value(0.123_46, &mut m), 0.123, epsilon = 1e-6);
        assert_abs_diff_eq!(b.set_value(0.123_6, &mut m), 0.124, epsilon = 1e-6);
        assert_abs_diff_eq!(m.metalness, 0.124, epsilon = 1e-6);

        let bias = panel.binding_mut(MaterialProperty::DisplacementBias).unwrap();
        assert_abs_diff_eq!(bias.set_value(-3.141_59, &mut m), -3.142, epsilon = 1e-4);
    }

    #[test]
    fn test_external_writes_are_not_reflected() {
        let mut m = test_material();
        let mut panel = ParameterPanel::standard(&m).unwrap();
        m.roughness = 0.25;
        let b = panel.binding_mut(MaterialProperty::Roughness).unwrap();
        assert_eq!(b.value(), 1.0);
        b.set_value(0.5, &mut m);
        assert_eq!(m.roughness, 0.5);
    }

    #[test]
    fn test_bind_rejects_bad_ranges() {
        let m = test_material();
        let mut panel = ParameterPanel::new();
        assert!(panel.bind(&m, MaterialProperty::Metalness, 1.0, 0.0, 0.1).is_err());
        assert!(panel.bind(&m, MaterialProperty::Metalness, 0.0, 1.0, 0.0).is_err());
        assert!(panel.bindings().is_empty());
    }
}
