mod multigrid;
mod transfer;
