mod loader;
mod nom_parser;

pub use self::{
    loader::load,
    nom_parser::{parse_source, BlackboardValue, PortDef, PortMap, TreeDef, TreeRootDef, TreeSource, VarDef},
};
