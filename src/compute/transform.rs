//! Embedding frames for manifolds.
//!
//! A [`Transform`] places a manifold inside its parent's 3D frame:
//! `parent = rotation * local + translation`. A moving body shares its pose
//! with every transform that tracks it through an `Rc<RefCell<Pose>>`; the
//! transforms hold only a `Weak` handle, so they become detached (and every
//! mapping call fails with [`FieldError::DetachedTransform`]) once the owner
//! drops the pose.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use nalgebra::{Matrix3, Vector3};

use super::FieldError;

/// Position and optional orientation of a manifold in its parent frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub translation: Vector3<f64>,
    /// `None` means the identity rotation.
    pub rotation: Option<Matrix3<f64>>,
}

impl Pose {
    pub fn at(translation: Vector3<f64>) -> Self {
        Self {
            translation,
            rotation: None,
        }
    }

    pub fn identity() -> Self {
        Self::at(Vector3::zeros())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

/// Pose shared between a moving body and the transforms tracking it.
pub type SharedPose = Rc<RefCell<Pose>>;

#[derive(Debug, Clone)]
enum Frame {
    Owned(Pose),
    Tracking(Weak<RefCell<Pose>>),
}

/// Boundary condition currently applied at an embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryCondition {
    None,
    Neumann,
    Dirichlet,
}

/// Embedding of a manifold into a parent 3D frame, plus boundary flags.
#[derive(Debug, Clone)]
pub struct Transform {
    frame: Frame,
    pub neumann: bool,
    pub dirichlet: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Pose::identity())
    }
}

impl Transform {
    /// Transform owning its pose.
    pub fn new(pose: Pose) -> Self {
        Self {
            frame: Frame::Owned(pose),
            neumann: false,
            dirichlet: false,
        }
    }

    /// Pure translation.
    pub fn translation_only(translation: Vector3<f64>) -> Self {
        Self::new(Pose::at(translation))
    }

    /// Transform following `owner`'s pose without taking ownership.
    pub fn tracking(owner: &SharedPose) -> Self {
        Self {
            frame: Frame::Tracking(Rc::downgrade(owner)),
            neumann: false,
            dirichlet: false,
        }
    }

    /// Re-point this transform at `owner`'s pose.
    pub fn track(&mut self, owner: &SharedPose) {
        self.frame = Frame::Tracking(Rc::downgrade(owner));
    }

    /// Stop tracking and keep a private copy of the current pose.
    pub fn detach(&mut self) -> Result<(), FieldError> {
        let pose = self.pose()?;
        self.frame = Frame::Owned(pose);
        Ok(())
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.frame, Frame::Tracking(_))
    }

    /// Snapshot of the current pose.
    pub fn pose(&self) -> Result<Pose, FieldError> {
        match &self.frame {
            Frame::Owned(pose) => Ok(pose.clone()),
            Frame::Tracking(weak) => weak
                .upgrade()
                .map(|pose| pose.borrow().clone())
                .ok_or(FieldError::DetachedTransform),
        }
    }

    pub fn translation(&self) -> Result<Vector3<f64>, FieldError> {
        self.pose().map(|p| p.translation)
    }

    /// Set the translation; a tracking transform writes through to its owner.
    pub fn set_translation(&mut self, translation: Vector3<f64>) -> Result<(), FieldError> {
        self.with_pose_mut(|pose| pose.translation = translation)
    }

    /// Set the rotation; a tracking transform writes through to its owner.
    pub fn set_rotation(&mut self, rotation: Option<Matrix3<f64>>) -> Result<(), FieldError> {
        self.with_pose_mut(|pose| pose.rotation = rotation)
    }

    fn with_pose_mut(&mut self, f: impl FnOnce(&mut Pose)) -> Result<(), FieldError> {
        match &mut self.frame {
            Frame::Owned(pose) => {
                f(pose);
                Ok(())
            }
            Frame::Tracking(weak) => {
                let owner = weak.upgrade().ok_or(FieldError::DetachedTransform)?;
                f(&mut owner.borrow_mut());
                Ok(())
            }
        }
    }

    /// Map a point from the embedded manifold's frame into the parent frame.
    pub fn to_parent(&self, local: &Vector3<f64>) -> Result<Vector3<f64>, FieldError> {
        let pose = self.pose()?;
        let rotated = match pose.rotation {
            Some(r) => r * local,
            None => *local,
        };
        Ok(rotated + pose.translation)
    }

    /// Map a point from the parent frame into the embedded manifold's frame.
    ///
    /// Rotations are assumed orthonormal.
    pub fn to_local(&self, parent: &Vector3<f64>) -> Result<Vector3<f64>, FieldError> {
        let pose = self.pose()?;
        let shifted = parent - pose.translation;
        Ok(match pose.rotation {
            Some(r) => r.transpose() * shifted,
            None => shifted,
        })
    }

    /// Rotate a parent-frame vector (e.g. a gradient) into the local frame.
    pub fn rotate_to_local(&self, v: &Vector3<f64>) -> Result<Vector3<f64>, FieldError> {
        let pose = self.pose()?;
        Ok(match pose.rotation {
            Some(r) => r.transpose() * v,
            None => *v,
        })
    }

    /// Dirichlet takes precedence when both flags are set.
    pub fn boundary_condition(&self) -> BoundaryCondition {
        if self.dirichlet {
            BoundaryCondition::Dirichlet
        } else if self.neumann {
            BoundaryCondition::Neumann
        } else {
            BoundaryCondition::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_round_trip() {
        let t = Transform::translation_only(Vector3::new(1.0, 2.0, 3.0));
        let local = Vector3::new(0.5, -0.5, 0.0);
        let parent = t.to_parent(&local).unwrap();
        assert_eq!(parent, Vector3::new(1.5, 1.5, 3.0));
        let back = t.to_local(&parent).unwrap();
        assert!((back - local).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_applied_before_translation() {
        // 90 degrees about z
        let r = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let t = Transform::new(Pose {
            translation: Vector3::new(10.0, 0.0, 0.0),
            rotation: Some(r),
        });
        let parent = t.to_parent(&Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert!((parent - Vector3::new(10.0, 1.0, 0.0)).norm() < 1e-12);

        let g = t.rotate_to_local(&Vector3::new(0.0, 1.0, 0.0)).unwrap();
        assert!((g - Vector3::new(1.0, 0.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_tracking_follows_owner() {
        let owner: SharedPose = Rc::new(RefCell::new(Pose::identity()));
        let t = Transform::tracking(&owner);
        owner.borrow_mut().translation = Vector3::new(4.0, 0.0, 0.0);
        assert_eq!(t.translation().unwrap(), Vector3::new(4.0, 0.0, 0.0));
    }

    #[test]
    fn test_tracking_writes_through() {
        let owner: SharedPose = Rc::new(RefCell::new(Pose::identity()));
        let mut t = Transform::tracking(&owner);
        t.set_translation(Vector3::new(0.0, 2.0, 0.0)).unwrap();
        assert_eq!(owner.borrow().translation, Vector3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_dropped_owner_detaches() {
        let owner: SharedPose = Rc::new(RefCell::new(Pose::identity()));
        let mut t = Transform::tracking(&owner);
        drop(owner);
        assert!(matches!(t.pose(), Err(FieldError::DetachedTransform)));
        assert!(matches!(
            t.to_parent(&Vector3::zeros()),
            Err(FieldError::DetachedTransform)
        ));
        assert!(t.detach().is_err());
    }

    #[test]
    fn test_detach_keeps_snapshot() {
        let owner: SharedPose = Rc::new(RefCell::new(Pose::at(Vector3::new(1.0, 1.0, 1.0))));
        let mut t = Transform::tracking(&owner);
        t.detach().unwrap();
        assert!(!t.is_tracking());
        owner.borrow_mut().translation = Vector3::zeros();
        assert_eq!(t.translation().unwrap(), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_boundary_condition_flags() {
        let mut t = Transform::default();
        assert_eq!(t.boundary_condition(), BoundaryCondition::None);
        t.neumann = true;
        assert_eq!(t.boundary_condition(), BoundaryCondition::Neumann);
        t.dirichlet = true;
        assert_eq!(t.boundary_condition(), BoundaryCondition::Dirichlet);
    }
}
