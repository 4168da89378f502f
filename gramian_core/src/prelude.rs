// gramian_core/src/prelude.rs

// --- Core Abstractions (The main contracts of the library) ---
pub use crate::models::dynamics::Dynamics;
pub use crate::observation::{ObservationAdapter, ObservationRequest};
pub use crate::search::CandidateFamily;
pub use crate::utils::integrators::Integrator;

// --- Core Data Structures (The "nouns" of the library) ---
pub use crate::error::{AdapterError, GramianError, GramianResult};
pub use crate::frames::Dof;
pub use crate::gramian::{
    Gramian, GramianArray, GramianBatch, GramianMeasures, IntegratedGramian, MeasureSet, N_DOF,
};
pub use crate::observation::{ObservationSetup, PerSample};
pub use crate::perturbation::PerturbationSet;
pub use crate::types::{Image, Pose};

// --- Gramian Pipeline ---
pub use crate::gramian::{
    accumulate_along_path, assemble_gramian, assemble_gramian_integrated, measures,
};
pub use crate::perturbation::perturb;
pub use crate::search::{search, SearchOutcome, SearchResult};

// --- Concrete Model Implementations (Export common ones for convenience) ---
pub use crate::models::dynamics::{NewtonEulerModel, RigidBodyParams};
pub use crate::models::trajectory::{
    simulate, FrameSampling, InitialCondition, PerturbedTrajectories, RigidBodyState, TimeGrid,
    Trajectory,
};
pub use crate::search::{ArcCandidate, SemicircleArcs, SphereViewpoints, ViewpointCandidate};
pub use crate::utils::integrators::RK4;
pub use crate::utils::spacing::{linspace, logspace};
