mod annotation;
mod node;
mod statute;

pub use annotation::{annotation_key, Annotation, AnnotationUpdate, NewAnnotation};
pub use node::{
    DeleteResult, Hierarchy, NewNode, Node, NodeKind, NodeUpdate, ParentRef, SiblingScope,
    ValidationError,
};
pub use statute::{parse_statute_date, NewStatute, Statute, StatuteUpdate};
