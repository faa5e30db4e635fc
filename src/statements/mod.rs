// Copyright 2024 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-dialect statement templates.
//!
//! Every statement a lock adapter issues is built here from a fixed set of
//! SQL template constants plus positional parameters, using each dialect's
//! own placeholder convention. Connection implementations and tests can
//! match on the constants directly.

pub mod mssql;
pub mod mysql;
pub mod oracle;
pub mod postgresql;
