/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Program, statement and expression definitions
/// - types: The type lattice and operator tags
pub mod ast;
pub mod types;
