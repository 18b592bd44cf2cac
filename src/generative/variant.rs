//! The four ensemble families and the descriptor that drives the step engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which GAN family an ensemble belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    /// One generator, one binary discriminator
    Vanilla,
    /// One code-conditioned generator, one binary discriminator, a Q-network
    InfoGan,
    /// K generators, K binary discriminators, a shared router
    DoPaNet,
    /// K generators, one discriminator over K + 1 classes
    MadGan,
}

impl VariantKind {
    pub const ALL: [VariantKind; 4] = [Self::Vanilla, Self::InfoGan, Self::DoPaNet, Self::MadGan];

    /// Descriptor for this family with `k` codes / generators.
    pub fn spec(self, k: usize) -> VariantSpec {
        let k = k.max(1);
        match self {
            Self::Vanilla => VariantSpec {
                kind: self,
                generators: 1,
                discriminators: 1,
                conditioning: Conditioning::None,
                routing: Routing::Broadcast,
                labelling: Labelling::Binary,
                classifier_classes: None,
            },
            Self::InfoGan => VariantSpec {
                kind: self,
                generators: 1,
                discriminators: 1,
                conditioning: Conditioning::SampledCode { codes: k },
                routing: Routing::Broadcast,
                labelling: Labelling::Binary,
                classifier_classes: Some(k),
            },
            Self::DoPaNet => VariantSpec {
                kind: self,
                generators: k,
                discriminators: k,
                conditioning: Conditioning::GeneratorIndex,
                routing: Routing::Classifier,
                labelling: Labelling::Binary,
                classifier_classes: Some(k),
            },
            Self::MadGan => VariantSpec {
                kind: self,
                generators: k,
                discriminators: 1,
                conditioning: Conditioning::GeneratorIndex,
                routing: Routing::Broadcast,
                labelling: Labelling::SourceClass { generators: k },
                classifier_classes: None,
            },
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vanilla => "vanilla",
            Self::InfoGan => "infogan",
            Self::DoPaNet => "dopanet",
            Self::MadGan => "madgan",
        };
        f.write_str(name)
    }
}

/// Extra input a generator sees, and what the auxiliary classifier predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conditioning {
    /// Noise only
    None,
    /// A one-hot code drawn uniformly per sample and fed to the generator
    SampledCode { codes: usize },
    /// The identity of the generator that produced the sample
    GeneratorIndex,
}

/// How real points reach the discriminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Every discriminator sees the whole real batch
    Broadcast,
    /// The classifier's arg-max picks one discriminator per point
    Classifier,
}

/// Target labels used by the discriminators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Labelling {
    /// Real is 1, fake is 0
    Binary,
    /// Real is class `generators`, fakes of generator `i` are class `i`
    SourceClass { generators: usize },
}

impl Labelling {
    /// Width of a discriminator output under this labelling.
    pub fn output_width(self) -> usize {
        match self {
            Self::Binary => 1,
            Self::SourceClass { generators } => generators + 1,
        }
    }
}

/// Everything the step engine needs to know about a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSpec {
    pub kind: VariantKind,
    pub generators: usize,
    pub discriminators: usize,
    pub conditioning: Conditioning,
    pub routing: Routing,
    pub labelling: Labelling,
    /// Output classes of the auxiliary classifier, if there is one
    pub classifier_classes: Option<usize>,
}

impl VariantSpec {
    /// Discriminator that judges generator `g`.
    pub fn discriminator_for(&self, generator: usize) -> usize {
        if self.discriminators == 1 {
            0
        } else {
            generator
        }
    }

    /// Generators whose fakes discriminator `d` is trained against.
    pub fn generators_judged_by(&self, discriminator: usize) -> Vec<usize> {
        (0..self.generators).filter(|&g| self.discriminator_for(g) == discriminator).collect()
    }

    /// Extra generator input columns beyond the noise.
    pub fn code_columns(&self) -> usize {
        match self.conditioning {
            Conditioning::SampledCode { codes } => codes,
            _ => 0,
        }
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier_classes.is_some()
    }
}
