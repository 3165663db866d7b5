use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("asyncBindable decorator must be used on a virtual getter (`{0}` is a field)")]
	NotAGetter(String),

	#[error("property `{0}` is not defined on class `{1}`")]
	UnknownProperty(String, String),

	#[error("property name `{0}` is in the reserved namespace")]
	ReservedName(String),

	#[error("property `{0}` is a getter and cannot be assigned")]
	ReadOnly(String),
}
