mod determinant;
mod persistence;
mod session;
