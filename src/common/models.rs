use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity identifiers are study-scoped integers handed out by the owning
/// `Study` at insertion time, so every id is stable and non-zero for the
/// lifetime of the entity. Equality across the model is id-based.
macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a [`crate::groups::models::Group`]
    GroupId
);
id_newtype!(
    /// Identifier of a [`crate::phases::models::Phase`]
    PhaseId
);
id_newtype!(
    /// Identifier of a [`crate::treatments::models::NamedTreatment`]
    TreatmentId
);
id_newtype!(
    /// Identifier of a [`crate::samplings::models::NamedSampling`]
    SamplingPlanId
);
id_newtype!(
    /// Identifier of a [`crate::studies::models::StudyAction`]
    ActionId
);
id_newtype!(
    /// Identifier of a [`crate::samplings::models::Sampling`] node, scoped
    /// to its owning sampling plan
    SamplingId
);
