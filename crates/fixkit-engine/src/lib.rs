pub mod controller;
pub mod flatpak;
pub mod gate;
pub mod queue;
pub mod runtime;
pub mod spawn;
pub mod status;
pub mod traits;

pub use controller::{TaskController, TaskState};
pub use flatpak::{FlatpakDirection, FlatpakToggle};
pub use gate::TaskGate;
pub use queue::CommandQueue;
pub use runtime::Engine;
pub use spawn::ProcessSpawner;
pub use status::{ActionKind, ResolvedAction, StatusResolver};
pub use traits::{Accent, CommandRunner, ConfirmationPrompt, HostWindow, Notifier, TaskView};
