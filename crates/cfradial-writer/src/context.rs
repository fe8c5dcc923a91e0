//! Everything derived from a volume before a file is opened.

use std::collections::HashMap;

use radx_model::{Field, Volume};

use crate::config::WriterConfig;
use crate::dimensions::DimensionPlan;
use crate::error::{Result, WriterError};
use crate::layout::GateLayout;
use crate::names::sanitize_field_name;
use crate::presence::Presence;

/// One field to be written: its volume name, variable name and the first
/// definition found, which fixes type, units and attributes.
#[derive(Debug, Clone)]
pub struct FieldPlan<'a> {
    pub name: String,
    pub var_name: String,
    pub template: &'a Field,
}

/// Borrowed volume plus its resolved layout, presence flags and dimensions.
#[derive(Debug)]
pub struct WriteContext<'a> {
    pub vol: &'a Volume,
    pub config: &'a WriterConfig,
    pub layout: GateLayout,
    pub presence: Presence,
    pub plan: DimensionPlan,
    pub fields: Vec<FieldPlan<'a>>,
}

impl<'a> WriteContext<'a> {
    /// Validate the volume and resolve everything the schema depends on.
    pub fn new(vol: &'a Volume, config: &'a WriterConfig) -> Result<Self> {
        if vol.rays.is_empty() {
            return Err(WriterError::InvalidVolume("volume has no rays".to_string()));
        }
        if vol.sweeps.is_empty() {
            return Err(WriterError::InvalidVolume("volume has no sweeps".to_string()));
        }
        vol.validate()?;

        let layout = GateLayout::resolve(vol, config.force_ragged);
        let presence = Presence::detect(vol);
        let plan = DimensionPlan::plan(vol, &layout);

        let mut fields = Vec::new();
        let mut seen: HashMap<String, String> = HashMap::new();
        for name in vol.unique_field_names() {
            let var_name = sanitize_field_name(&name);
            if let Some(other) = seen.insert(var_name.clone(), name.clone()) {
                return Err(WriterError::schema(format!(
                    "fields {} and {} both map to variable {}",
                    other, name, var_name
                )));
            }
            let template = vol.field_template(&name)?;
            fields.push(FieldPlan {
                name,
                var_name,
                template,
            });
        }

        Ok(Self {
            vol,
            config,
            layout,
            presence,
            plan,
            fields,
        })
    }

    pub fn n_rays(&self) -> usize {
        self.vol.rays.len()
    }

    /// Field dimension names for the chosen layout.
    pub fn field_dims(&self) -> &'static [&'static str] {
        use crate::names::dims;
        if self.layout.n_gates_vary {
            &[dims::N_POINTS]
        } else {
            &[dims::TIME, dims::RANGE]
        }
    }
}
