pub mod gatk;
pub mod lims;
pub mod picard;
