// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ray, triangle and box queries against mesh faces

mod face_intersector;

pub use face_intersector::{FaceFilter, FaceHit, FaceIntersector, FaceNode};
