// gramian_core/src/utils/integrators.rs

use nalgebra::DVector;

/// A single-step ODE solver for `x_dot = f(x, t)`.
pub trait Integrator<T> {
    fn step(
        &self,
        func: &dyn Fn(&DVector<T>, T) -> DVector<T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> DVector<T>;
}

// Runge-Kutta methods
#[derive(Debug, Default, Clone, Copy)]
pub struct RK1;

impl<T> Integrator<T> for RK1
where
    T: Copy + num_traits::Float + std::ops::Mul<DVector<T>, Output = DVector<T>>,
    DVector<T>: std::ops::Add<Output = DVector<T>>,
{
    fn step(
        &self,
        func: &dyn Fn(&DVector<T>, T) -> DVector<T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> DVector<T> {
        let dt: T = tf - t0;
        x0.clone() + dt * func(x0, t0) // Euler's method
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RK2;

impl<T> Integrator<T> for RK2
where
    T: Copy + num_traits::Float + std::ops::Mul<DVector<T>, Output = DVector<T>>,
    DVector<T>: std::ops::Add<Output = DVector<T>>,
{
    fn step(
        &self,
        func: &dyn Fn(&DVector<T>, T) -> DVector<T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> DVector<T> {
        let dt: T = tf - t0;
        let half = T::from(0.5).unwrap_or_else(T::zero);
        let k1: DVector<T> = func(x0, t0);
        let k2: DVector<T> = func(&(x0.clone() + dt * k1.clone()), tf);

        // Heun: average of the slopes at both ends
        x0.clone() + half * dt * (k1 + k2)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RK4;

impl<T> Integrator<T> for RK4
where
    T: Copy + num_traits::Float + std::ops::Mul<DVector<T>, Output = DVector<T>>,
    DVector<T>: std::ops::Add<Output = DVector<T>>,
{
    fn step(
        &self,
        func: &dyn Fn(&DVector<T>, T) -> DVector<T>,
        x0: &DVector<T>,
        t0: T,
        tf: T,
    ) -> DVector<T> {
        let dt = tf - t0;
        let one = T::one();
        let two = one + one;
        let half = one / two;
        let sixth = one / (two + two + two);

        let k1 = func(x0, t0);
        let k2 = func(&(x0.clone() + half * dt * k1.clone()), t0 + half * dt);
        let k3 = func(&(x0.clone() + half * dt * k2.clone()), t0 + half * dt);
        let k4 = func(&(x0.clone() + dt * k3.clone()), tf);

        x0.clone() + dt * sixth * (k1 + two * k2 + two * k3 + k4)
    }
}
