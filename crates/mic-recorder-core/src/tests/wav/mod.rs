mod dump;
mod finalizer;
