//! Building one half (forward or backward) of the model.

use impasse_ir::Component;

use crate::encoder::{Direction, EncodingError, SboxTable, TruncatedEncoder};
use crate::items::CpItem;

/// What happened to one component during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentOutcome {
    Modeled,
    /// Left out of the model; the model is still usable but incomplete.
    Skipped(EncodingError),
}

impl ComponentOutcome {
    pub fn is_modeled(&self) -> bool {
        matches!(self, ComponentOutcome::Modeled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReport {
    pub id: String,
    pub direction: Direction,
    pub outcome: ComponentOutcome,
}

/// Variables and constraints of one direction, before any namespacing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfModel {
    pub direction: Direction,
    /// Ids of every component the half was built from, modeled or not.
    pub component_ids: Vec<String>,
    pub variables: Vec<CpItem>,
    pub constraints: Vec<CpItem>,
    pub reports: Vec<ComponentReport>,
}

impl HalfModel {
    pub fn is_complete(&self) -> bool {
        self.reports.iter().all(|r| r.outcome.is_modeled())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &ComponentReport> {
        self.reports.iter().filter(|r| !r.outcome.is_modeled())
    }
}

/// State owned by a single model build: the encoder and the S-box memo.
pub struct BuildSession<E> {
    encoder: E,
    sbox_table: SboxTable,
}

impl<E: TruncatedEncoder> BuildSession<E> {
    pub fn new(encoder: E) -> Self {
        Self {
            encoder,
            sbox_table: SboxTable::new(),
        }
    }

    pub fn sbox_table(&self) -> &SboxTable {
        &self.sbox_table
    }

    pub fn into_sbox_table(self) -> SboxTable {
        self.sbox_table
    }

    /// Encode `components` in order. Components that cannot be encoded are
    /// reported and skipped, never fatal.
    pub fn build_half<'c>(
        &mut self,
        components: impl IntoIterator<Item = &'c Component>,
        direction: Direction,
    ) -> HalfModel {
        let mut half = HalfModel {
            direction,
            component_ids: Vec::new(),
            variables: Vec::new(),
            constraints: Vec::new(),
            reports: Vec::new(),
        };

        for component in components {
            half.component_ids.push(component.id.clone());
            let encoded = match component.kind.check_supported() {
                Err(reason) => Err(EncodingError::from(reason)),
                Ok(()) if component.kind.is_sbox() => {
                    self.encoder
                        .encode_sbox(component, direction, &mut self.sbox_table)
                }
                Ok(()) => self.encoder.encode(component, direction),
            };

            let outcome = match encoded {
                Ok(encoding) => {
                    tracing::debug!(
                        component = %component.id,
                        direction = direction.as_str(),
                        variables = encoding.variables.len(),
                        constraints = encoding.constraints.len(),
                        "encoded component"
                    );
                    half.variables.extend(encoding.variables);
                    half.constraints.extend(encoding.constraints);
                    ComponentOutcome::Modeled
                }
                Err(reason) => {
                    tracing::warn!(
                        component = %component.id,
                        kind = component.kind.name(),
                        direction = direction.as_str(),
                        %reason,
                        "component skipped; model is incomplete"
                    );
                    ComponentOutcome::Skipped(reason)
                }
            };
            half.reports.push(ComponentReport {
                id: component.id.clone(),
                direction,
                outcome,
            });
        }

        half
    }
}
