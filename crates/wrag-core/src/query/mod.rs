// SPDX-License-Identifier: GPL-3.0
// Copyright (c) 2026 Matt Hesketh <matt@matthesketh.pro>

mod assemble;
mod contextual;
mod prompt;
mod source;

pub use assemble::assemble_context;
pub use contextual::build_contextual_query;
pub use prompt::PromptAssembly;
pub use source::select_source;
